use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use debate_agents::config::RunnerConfig;
use debate_agents::dataset::{MmluSource, TaskSource, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED};
use debate_agents::providers::ProviderRouter;
use debate_agents::runner::{run_benchmark, run_team_file, BenchmarkOptions};
use debate_agents::team_file::TeamFile;
use debate_core::{Completion, Strategy};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "debate-agents", about = "Multi-agent LLM debates")]
struct Cli {
    /// TOML file overriding endpoint and sampling settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Debate sampled MMLU questions.
    Mmlu(MmluArgs),
    /// Run a debate described by a team file.
    Debate(DebateArgs),
}

#[derive(Args, Debug)]
struct MmluArgs {
    /// MMLU rows as JSON Lines.
    #[arg(long)]
    dataset: PathBuf,
    #[arg(long, default_value = "meta-llama/Llama-3.2-1B-Instruct")]
    model: String,
    #[arg(long, default_value_t = 1)]
    runs: usize,
    #[arg(long, default_value_t = 3)]
    num_agents: usize,
    #[arg(long, default_value_t = 1)]
    rounds: usize,
    #[arg(long, default_value = "efficient")]
    strategy: Strategy,
    #[arg(long, default_value_t = 1)]
    eval_rate: usize,
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,
}

#[derive(Args, Debug)]
struct DebateArgs {
    #[arg(long)]
    team: PathBuf,
    /// Replaces the file's topic.
    #[arg(long)]
    topic: Option<String>,
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = RunnerConfig::load(cli.config.as_deref())?;
    let completion: Arc<dyn Completion> = Arc::new(ProviderRouter::from_config(&config)?);

    let summary = match cli.command {
        Command::Mmlu(args) => {
            let source = MmluSource::new(&args.dataset, args.sample_size, args.seed);
            let tasks = source.tasks()?;
            info!(
                dataset = %source.path().display(),
                tasks = tasks.len(),
                model = %args.model,
                strategy = %args.strategy,
                "Loaded benchmark tasks"
            );
            let opts = BenchmarkOptions {
                dataset: source.name().to_string(),
                model: args.model,
                runs: args.runs,
                num_agents: args.num_agents,
                rounds: args.rounds,
                eval_rate: args.eval_rate,
                strategy: args.strategy,
                output_dir: args.output_dir,
            };
            run_benchmark(completion, &tasks, &opts).await?
        }
        Command::Debate(args) => {
            let file = TeamFile::load(&args.team)?;
            run_team_file(completion, &file, args.topic.as_deref(), &args.output_dir).await?
        }
    };

    info!(
        kickoffs = summary.kickoffs,
        files = summary.files_written.len(),
        prompt_tokens = summary.usage.prompt_token,
        generated_tokens = summary.usage.generated_token,
        "Done"
    );
    Ok(())
}

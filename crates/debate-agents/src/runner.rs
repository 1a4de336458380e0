//! Batch drivers: one kickoff per task, logs written as each finishes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use debate_core::{Agent, Completion, KickoffOutcome, Strategy, Team, TokenUsage};
use tracing::{info, info_span, Instrument};

use crate::dataset::{TaskRecord, MMLU_SYSTEM_TEXT};
use crate::output::{OutputSink, RunLayout};
use crate::team_file::TeamFile;

/// Parameters of a benchmark sweep.
#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    pub dataset: String,
    pub model: String,
    pub runs: usize,
    pub num_agents: usize,
    pub rounds: usize,
    pub eval_rate: usize,
    pub strategy: Strategy,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub kickoffs: usize,
    pub files_written: Vec<PathBuf>,
    pub usage: TokenUsage,
}

impl RunSummary {
    fn absorb(&mut self, outcome: &KickoffOutcome) {
        let usage = outcome.discussion.total_usage();
        self.kickoffs += 1;
        self.usage.prompt_token += usage.prompt_token;
        self.usage.generated_token += usage.generated_token;
    }
}

/// `Agent 1..=n`, no persona, no beliefs, all on one model.
pub fn anonymous_team(
    num_agents: usize,
    model: &str,
    strategy: Strategy,
    completion: &Arc<dyn Completion>,
) -> Team {
    let agents = (1..=num_agents)
        .map(|k| Agent::new(format!("Agent {k}"), "", vec![], model, completion.clone()))
        .collect();
    Team::new(agents, (0..num_agents).collect(), strategy)
}

fn write_outcome(
    sink: &OutputSink,
    index: usize,
    strategy: Strategy,
    outcome: &KickoffOutcome,
    summary: &mut RunSummary,
) -> Result<()> {
    summary
        .files_written
        .push(sink.write_discussion(index, &outcome.discussion)?);
    if strategy == Strategy::Belief {
        summary
            .files_written
            .push(sink.write_belief_changes(index, &outcome.belief_changes)?);
    }
    Ok(())
}

/// Debate every task `opts.runs` times.
pub async fn run_benchmark(
    completion: Arc<dyn Completion>,
    tasks: &[TaskRecord],
    opts: &BenchmarkOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for run in 0..opts.runs {
        let layout = RunLayout {
            dataset: opts.dataset.clone(),
            strategy: opts.strategy,
            model: opts.model.clone(),
            run,
            num_agents: opts.num_agents,
        };
        let sink = OutputSink::create(&opts.output_dir, &layout)?;
        info!(run, folder = %sink.dir().display(), tasks = tasks.len(), "Starting run");

        for (j, task) in tasks.iter().enumerate() {
            let mut team = anonymous_team(opts.num_agents, &opts.model, opts.strategy, &completion);
            let outcome = team
                .kickoff(MMLU_SYSTEM_TEXT, &task.prompt_text, opts.rounds, opts.eval_rate)
                .instrument(info_span!("task", run, index = j))
                .await
                .with_context(|| format!("run {run}, task {j} ({})", task.subject))?;

            info!(run, index = j, gold = %task.gold_answer, "Task debated");
            summary.absorb(&outcome);
            write_outcome(&sink, j, opts.strategy, &outcome, &mut summary)?;
        }
    }

    Ok(summary)
}

/// Run a team file once and write its logs to a fresh
/// `debate_{UTC timestamp}` folder under `output_dir`.
pub async fn run_team_file(
    completion: Arc<dyn Completion>,
    file: &TeamFile,
    topic_override: Option<&str>,
    output_dir: &Path,
) -> Result<RunSummary> {
    let topic = topic_override.unwrap_or(&file.topic);
    let system_text = match topic_override {
        Some(t) if file.system_text.is_none() => t,
        _ => file.system_text(),
    };

    let mut team = file.build_team(completion)?;
    for agent in team.agents() {
        info!("{}", agent.describe());
    }

    let outcome = team
        .kickoff(system_text, topic, file.rounds, file.eval_rate)
        .await
        .context("debate failed")?;

    let prefix = format!("debate_{}", Utc::now().format("%Y%m%dT%H%M%SZ"));
    let sink = OutputSink::in_dir(output_dir.join(&prefix), prefix)?;
    let mut summary = RunSummary::default();
    summary.absorb(&outcome);
    write_outcome(&sink, 0, file.strategy, &outcome, &mut summary)?;
    Ok(summary)
}

//! End-to-end runs against an in-process completion backend, writing into
//! temporary directories.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use debate_agents::dataset::{MmluSource, TaskSource};
use debate_agents::runner::{run_benchmark, run_team_file, BenchmarkOptions};
use debate_agents::team_file::TeamFile;
use debate_core::{
    Completion, CompletionError, CompletionRequest, CompletionResponse, Strategy, TokenUsage,
};

// ── Helpers ──

/// Answers free text with a fixed vote and structured requests with strength 2.
#[derive(Default)]
struct FixedVote {
    calls: AtomicUsize,
}

#[async_trait]
impl Completion for FixedVote {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = if request.response_format.is_some() {
            r#"{"belief": "kept", "updated_strength": 2}"#.to_string()
        } else {
            " Answer: B; Confidence: 80%".to_string()
        };
        Ok(CompletionResponse {
            text,
            usage: TokenUsage {
                prompt_token: 10,
                generated_token: 5,
            },
        })
    }
}

fn write_dataset(dir: &std::path::Path, rows: usize) -> std::path::PathBuf {
    let path = dir.join("mmlu.jsonl");
    let body: Vec<String> = (0..rows)
        .map(|i| {
            format!(
                r#"{{"question":"Q{i}?","subject":"college_biology","choices":["a","b","c","d"],"answer":{}}}"#,
                i % 4
            )
        })
        .collect();
    fs::write(&path, body.join("\n")).unwrap();
    path
}

fn options(output_dir: std::path::PathBuf, strategy: Strategy) -> BenchmarkOptions {
    BenchmarkOptions {
        dataset: "mmlu".to_string(),
        model: "llama3.2:1b".to_string(),
        runs: 2,
        num_agents: 3,
        rounds: 2,
        eval_rate: 1,
        strategy,
        output_dir,
    }
}

// ── Benchmark runs ──

#[tokio::test]
async fn benchmark_writes_one_discussion_per_task_and_run() {
    let tmp = tempfile::tempdir().unwrap();
    let dataset = write_dataset(tmp.path(), 10);
    let tasks = MmluSource::new(&dataset, 2, 42).tasks().unwrap();
    assert_eq!(tasks.len(), 2);

    let backend = Arc::new(FixedVote::default());
    let out = tmp.path().join("results");
    let summary = run_benchmark(backend.clone(), &tasks, &options(out.clone(), Strategy::Efficient))
        .await
        .unwrap();

    // 2 runs x 2 tasks x (3 agents x 2 rounds)
    assert_eq!(summary.kickoffs, 4);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 24);
    assert_eq!(summary.files_written.len(), 4);
    assert_eq!(summary.usage.prompt_token, 240);

    let run0 = out.join("mmlu_efficient_llama3.2_1b_run_0_agents_3");
    let file = run0.join("mmlu_efficient_llama3.2_1b_run_0_agents_3_discussion_log_1.json");
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(file).unwrap()).unwrap();
    assert_eq!(value["Round 2"]["Agent 3"]["output"], "Answer: B; Confidence: 80%");
    assert_eq!(value["Round 1"]["Agent 1"]["generated_token"], 5);
    assert!(out.join("mmlu_efficient_llama3.2_1b_run_1_agents_3").is_dir());
}

#[tokio::test]
async fn belief_benchmark_also_writes_belief_logs() {
    let tmp = tempfile::tempdir().unwrap();
    let dataset = write_dataset(tmp.path(), 3);
    let tasks = MmluSource::new(&dataset, 1, 7).tasks().unwrap();

    let mut opts = options(tmp.path().join("out"), Strategy::Belief);
    opts.runs = 1;
    let summary = run_benchmark(Arc::new(FixedVote::default()), &tasks, &opts)
        .await
        .unwrap();

    assert_eq!(summary.files_written.len(), 2);
    let beliefs = &summary.files_written[1];
    assert!(beliefs
        .to_string_lossy()
        .ends_with("mmlu_belief_llama3.2_1b_run_0_agents_3_belief_change_log_0.json"));
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(beliefs).unwrap()).unwrap();
    assert!(value["Agent 1"]["Initial"].as_array().unwrap().is_empty());
    assert!(value["Agent 1"].get("Round 2").is_some());
}

#[tokio::test]
async fn missing_dataset_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let err = MmluSource::new(tmp.path().join("nope.jsonl"), 5, 42)
        .tasks()
        .unwrap_err();
    assert!(err.to_string().contains("Failed to read dataset"));
}

// ── Team files ──

#[tokio::test]
async fn team_file_run_revises_beliefs() {
    let tmp = tempfile::tempdir().unwrap();
    let file = TeamFile::parse(
        r#"
topic = "Does the new generation need college education?"
strategy = "belief"
rounds = 2

[[agents]]
name = "Agent 1"
persona = "A compassionate and intuitive therapist"
model = "llama3.2:1b"
beliefs = [{ statement = "Emotional well-being is as important as physical health", strength = 4 }]

[[agents]]
name = "Agent 2"
persona = "self-confident influencer"
openness = 1
model = "llama3.2:1b"
beliefs = [{ statement = "Success is a result of hard work and strategic risk-taking", strength = 5 }]
"#,
    )
    .unwrap();

    let backend = Arc::new(FixedVote::default());
    let summary = run_team_file(backend.clone(), &file, None, tmp.path())
        .await
        .unwrap();

    // 4 turns + 2 sweeps x 2 agents x 1 belief
    assert_eq!(backend.calls.load(Ordering::SeqCst), 8);
    assert_eq!(summary.files_written.len(), 2);

    let log: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary.files_written[1]).unwrap()).unwrap();
    assert_eq!(log["Agent 2"]["Initial"][0]["strength"], 5);
    assert_eq!(log["Agent 2"]["Round 1"][0]["strength"], 2);
    assert_eq!(
        log["Agent 2"]["Round 2"][0]["statement"],
        "Success is a result of hard work and strategic risk-taking"
    );
}

#[tokio::test]
async fn team_file_with_bad_pattern_fails_before_any_call() {
    let tmp = tempfile::tempdir().unwrap();
    let file = TeamFile::parse(
        r#"
topic = "t"
pattern = [0, 3]

[[agents]]
name = "Agent 1"
model = "m"
"#,
    )
    .unwrap();

    let backend = Arc::new(FixedVote::default());
    assert!(run_team_file(backend.clone(), &file, Some("other topic"), tmp.path())
        .await
        .is_err());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

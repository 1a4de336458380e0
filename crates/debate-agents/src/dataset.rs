//! Task sources for benchmark runs.
//!
//! MMLU rows are read from JSON Lines, one `{question, subject, choices, answer}`
//! object per line, and sampled deterministically by seed.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Debate instructions for multiple-choice questions.
pub const MMLU_SYSTEM_TEXT: &str = "Engage in an active debate to determine the correct answer. \
Contribute your reasoning in no more than five sentences. Finalize your answer with the choice \
you believe is most appropriate (A, B, C, or D) and provide your confidence level \
(Confidence scale: 0% = very low confidence, 100% = very high confidence). \
Provide your decision in the following format:\nAnswer: <A/B/C/D>; Confidence: <NN%>";

const PROMPTING_METHOD: &str = "Let's think step by step.";

/// One question ready for a debate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub prompt_text: String,
    pub subject: String,
    pub choices: Vec<String>,
    /// Correct choice letter.
    pub gold_answer: String,
}

/// Anything that yields debate tasks.
pub trait TaskSource {
    /// Short name used in output folder names.
    fn name(&self) -> &str;

    fn tasks(&self) -> Result<Vec<TaskRecord>>;
}

/// Raw MMLU row; `answer` indexes `choices`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MmluRow {
    pub question: String,
    pub subject: String,
    pub choices: Vec<String>,
    pub answer: usize,
}

fn choice_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
}

impl MmluRow {
    pub fn to_task(&self) -> Result<TaskRecord> {
        let gold = choice_letter(self.answer)
            .filter(|_| self.answer < self.choices.len())
            .with_context(|| {
                format!(
                    "answer index {} out of range for {} choices",
                    self.answer,
                    self.choices.len()
                )
            })?;

        let mut formatted = Vec::with_capacity(self.choices.len());
        for (i, choice) in self.choices.iter().enumerate() {
            let letter =
                choice_letter(i).with_context(|| format!("too many choices ({})", self.choices.len()))?;
            formatted.push(format!("{letter}: {choice}"));
        }

        let subject = self.subject.replace('_', " ");
        let prompt_text = format!(
            "Subject: {subject}\nQuestion: {}\nChoices:\n{}\n{PROMPTING_METHOD}",
            self.question,
            formatted.join("\n")
        );

        Ok(TaskRecord {
            prompt_text,
            subject,
            choices: self.choices.clone(),
            gold_answer: gold.to_string(),
        })
    }
}

pub fn parse_rows(raw: &str) -> Result<Vec<MmluRow>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid MMLU row on line {}", i + 1))
        })
        .collect()
}

/// Draw `n` rows with a seeded RNG. Returns every row when `n` covers the set.
pub fn sample_rows(rows: &[MmluRow], n: usize, seed: u64) -> Vec<MmluRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    rows.choose_multiple(&mut rng, n).cloned().collect()
}

#[derive(Debug, Clone)]
pub struct MmluSource {
    path: PathBuf,
    sample_size: usize,
    seed: u64,
}

impl MmluSource {
    pub fn new(path: impl Into<PathBuf>, sample_size: usize, seed: u64) -> Self {
        Self {
            path: path.into(),
            sample_size,
            seed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskSource for MmluSource {
    fn name(&self) -> &str {
        "mmlu"
    }

    fn tasks(&self) -> Result<Vec<TaskRecord>> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read dataset {}", self.path.display()))?;
        let rows = parse_rows(&raw)?;
        if rows.is_empty() {
            bail!("dataset {} has no rows", self.path.display());
        }
        sample_rows(&rows, self.sample_size, self.seed)
            .iter()
            .map(MmluRow::to_task)
            .collect()
    }
}

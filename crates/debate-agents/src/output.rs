//! Result files for finished kickoffs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use debate_core::{BeliefChangeLog, DiscussionRecord, Strategy};
use serde::Serialize;
use tracing::debug;

/// Model id made safe for a path component.
pub fn model_filename(model: &str) -> String {
    model.replace(['/', ':'], "_")
}

/// Identifies one run of one configuration.
///
/// The strategy segment is the canonical name, so runs requested as
/// `standard` land in `mmlu_efficient_...` folders. Older `mmlu_standard_...`
/// results hold the same strategy under the legacy label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub dataset: String,
    pub strategy: Strategy,
    pub model: String,
    pub run: usize,
    pub num_agents: usize,
}

impl RunLayout {
    /// `{dataset}_{strategy}_{model}_run_{run}_agents_{n}`; also the file prefix.
    pub fn folder_name(&self) -> String {
        format!(
            "{}_{}_{}_run_{}_agents_{}",
            self.dataset,
            self.strategy,
            model_filename(&self.model),
            self.run,
            self.num_agents
        )
    }
}

/// Writes pretty JSON logs into one run folder.
#[derive(Debug, Clone)]
pub struct OutputSink {
    dir: PathBuf,
    prefix: String,
}

impl OutputSink {
    pub fn create(root: &Path, layout: &RunLayout) -> Result<Self> {
        let prefix = layout.folder_name();
        Self::in_dir(root.join(&prefix), prefix)
    }

    /// Sink writing `{prefix}_..._{index}.json` directly into `dir`.
    pub fn in_dir(dir: PathBuf, prefix: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output dir {}", dir.display()))?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn discussion_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}_discussion_log_{index}.json", self.prefix))
    }

    pub fn belief_change_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}_belief_change_log_{index}.json", self.prefix))
    }

    pub fn write_discussion(&self, index: usize, record: &DiscussionRecord) -> Result<PathBuf> {
        let path = self.discussion_path(index);
        write_json(&path, record)?;
        Ok(path)
    }

    pub fn write_belief_changes(&self, index: usize, log: &BeliefChangeLog) -> Result<PathBuf> {
        let path = self.belief_change_path(index);
        write_json(&path, log)?;
        Ok(path)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), "Wrote log");
    Ok(())
}

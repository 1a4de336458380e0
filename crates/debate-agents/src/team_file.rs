//! TOML description of a free-form debate.
//!
//! ```toml
//! topic = "Does the new generation need college education?"
//! strategy = "belief"
//! rounds = 2
//!
//! [[agents]]
//! name = "Agent 1"
//! persona = "A compassionate and intuitive therapist"
//! openness = 4
//! model = "llama3.2:1b"
//! beliefs = [{ statement = "Emotional well-being is as important as physical health", strength = 4 }]
//! ```
//!
//! `system_text` defaults to the topic; `pattern` defaults to every agent once,
//! in file order.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use debate_core::prompts::openness_persona;
use debate_core::{Agent, Belief, Completion, Strategy, Team};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BeliefSpec {
    pub statement: String,
    pub strength: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub persona: String,
    /// Open-mindedness level 1..=5, appended to the persona.
    pub openness: Option<u8>,
    pub model: String,
    #[serde(default)]
    pub beliefs: Vec<BeliefSpec>,
}

impl AgentSpec {
    /// Persona text with the open-mindedness line appended.
    pub fn full_persona(&self) -> Result<String> {
        let Some(level) = self.openness else {
            return Ok(self.persona.clone());
        };
        let line = openness_persona(level)
            .ok_or_else(|| anyhow!("agent {}: openness {level} outside 1..=5", self.name))?;
        Ok(if self.persona.is_empty() {
            line.to_string()
        } else {
            format!("{} {line}", self.persona)
        })
    }

    pub fn build(&self, completion: Arc<dyn Completion>) -> Result<Agent> {
        let beliefs = self
            .beliefs
            .iter()
            .map(|b| Belief::new(&b.statement, b.strength))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("agent {}: invalid belief", self.name))?;
        Ok(Agent::new(
            &self.name,
            self.full_persona()?,
            beliefs,
            &self.model,
            completion,
        ))
    }
}

fn default_rounds() -> usize {
    1
}

fn default_eval_rate() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamFile {
    pub topic: String,
    pub system_text: Option<String>,
    pub agents: Vec<AgentSpec>,
    pub pattern: Option<Vec<usize>>,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default = "default_eval_rate")]
    pub eval_rate: usize,
}

impl TeamFile {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read team file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to parse team file {}", path.display()))
    }

    pub fn system_text(&self) -> &str {
        self.system_text.as_deref().unwrap_or(&self.topic)
    }

    pub fn pattern(&self) -> Vec<usize> {
        self.pattern
            .clone()
            .unwrap_or_else(|| (0..self.agents.len()).collect())
    }

    /// All agents share one completion backend; routing happens per model inside it.
    pub fn build_team(&self, completion: Arc<dyn Completion>) -> Result<Team> {
        let agents = self
            .agents
            .iter()
            .map(|spec| spec.build(completion.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Team::new(agents, self.pattern(), self.strategy))
    }
}

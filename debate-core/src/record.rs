//! Structured session output: the discussion record and the belief change log.
//!
//! Both keep insertion order and serialize as nested JSON objects:
//!
//! ```text
//! DiscussionRecord  "Round N" → agent → { output, prompt_token, generated_token }
//! BeliefChangeLog   agent → "Initial" | "Round N" → [{ statement, strength }]
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::belief::Belief;
use crate::completion::TokenUsage;

/// Label of the snapshot taken before the first turn.
pub const INITIAL_CHECKPOINT: &str = "Initial";

pub fn round_label(round: usize) -> String {
    format!("Round {round}")
}

/// Ordered key/value list serialized as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn entry_or_default(&mut self, key: &str) -> &mut V
    where
        V: Default,
    {
        let pos = match self.entries.iter().position(|(k, _)| k == key) {
            Some(pos) => pos,
            None => {
                self.entries.push((key.to_string(), V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Insert, replacing the value in place when the key exists.
    fn insert(&mut self, key: &str, value: V) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// What one agent said in one round.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct TurnOutput {
    pub output: String,
    pub prompt_token: u64,
    pub generated_token: u64,
}

impl TurnOutput {
    pub fn new(output: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            output: output.into(),
            prompt_token: usage.prompt_token,
            generated_token: usage.generated_token,
        }
    }
}

/// Round-by-round outputs of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscussionRecord {
    rounds: OrderedMap<OrderedMap<TurnOutput>>,
}

impl DiscussionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `agent`'s output for `round`. A second turn by the same agent
    /// in the same round replaces the first.
    pub fn record(&mut self, round: usize, agent: &str, output: TurnOutput) {
        self.rounds
            .entry_or_default(&round_label(round))
            .insert(agent, output);
    }

    pub fn get(&self, round: usize, agent: &str) -> Option<&TurnOutput> {
        self.rounds.get(&round_label(round))?.get(agent)
    }

    pub fn round_labels(&self) -> Vec<&str> {
        self.rounds.keys().collect()
    }

    /// Agents with an entry in `round`, in speaking order.
    pub fn speakers(&self, round: usize) -> Vec<&str> {
        self.rounds
            .get(&round_label(round))
            .map(|r| r.keys().collect())
            .unwrap_or_default()
    }

    /// Number of `(round, agent)` entries.
    pub fn entry_count(&self) -> usize {
        self.rounds.entries.iter().map(|(_, r)| r.len()).sum()
    }

    /// Total tokens across every entry.
    pub fn total_usage(&self) -> TokenUsage {
        self.rounds
            .entries
            .iter()
            .flat_map(|(_, r)| r.entries.iter())
            .fold(TokenUsage::default(), |acc, (_, out)| TokenUsage {
                prompt_token: acc.prompt_token + out.prompt_token,
                generated_token: acc.generated_token + out.generated_token,
            })
    }
}

impl Serialize for DiscussionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rounds.serialize(serializer)
    }
}

/// Belief snapshots per agent and checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeliefChangeLog {
    agents: OrderedMap<OrderedMap<Vec<Belief>>>,
}

impl BeliefChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&mut self, agent: &str, checkpoint: &str, beliefs: &[Belief]) {
        self.agents
            .entry_or_default(agent)
            .insert(checkpoint, beliefs.to_vec());
    }

    pub fn get(&self, agent: &str, checkpoint: &str) -> Option<&[Belief]> {
        self.agents
            .get(agent)?
            .get(checkpoint)
            .map(Vec::as_slice)
    }

    pub fn checkpoints(&self, agent: &str) -> Vec<&str> {
        self.agents
            .get(agent)
            .map(|c| c.keys().collect())
            .unwrap_or_default()
    }

    pub fn agents(&self) -> Vec<&str> {
        self.agents.keys().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.len() == 0
    }
}

impl Serialize for BeliefChangeLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.agents.serialize(serializer)
    }
}

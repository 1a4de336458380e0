//! Shared transcript state and per-agent view assembly.
//!
//! The scheduler owns one [`Transcript`] per session and passes it by `&mut`
//! into each turn. Only one turn runs at a time, so an agent's view is
//! always built from fully settled logs.
//!
//! # View layout
//!
//! ```text
//! system    "You are {agent}. {system_text}"
//! user      heard lines ⏎ "###" ⏎ task prompt      ← before own turn 1
//! assistant own answer 1
//! user      heard lines ⏎ "###" ⏎ task prompt      ← before own turn 2
//! assistant own answer 2
//! ...
//! user      heard lines ⏎ "###" ⏎ task prompt      ← current question
//! ```
//!
//! "Heard lines" are the labelled utterances of other agents that arrived
//! since the agent last spoke, by round and then team order. A question with
//! nothing heard is the bare task prompt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::completion::{ChatMessage, Role, TokenUsage};
use crate::error::{DebateError, DebateResult};

/// Marker between heard content and the task prompt.
pub const SEPARATOR: &str = "\n\n###\n\n";

/// One agent's output for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub agent: String,
    /// 0-based index into the session's order.
    pub turn: usize,
    /// 1-based round.
    pub round: usize,
    /// Generated text, without the speaker prefix.
    pub text: String,
    pub usage: TokenUsage,
}

impl Utterance {
    /// `"{agent}: {text}"`, the form other agents hear.
    pub fn labelled(&self) -> String {
        format!("{}: {}", self.agent, self.text)
    }
}

/// Append-only log of one agent's own utterances.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentLog {
    pub agent: String,
    utterances: Vec<Utterance>,
}

impl AgentLog {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            utterances: Vec::new(),
        }
    }

    /// Rebuild a log from saved utterances (replay/debugging).
    pub fn from_utterances(agent: impl Into<String>, utterances: Vec<Utterance>) -> Self {
        Self {
            agent: agent.into(),
            utterances,
        }
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}

/// Shared session state handed to each turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// One log per agent, in team order.
    logs: Vec<AgentLog>,
    /// Exact messages sent on each agent's latest turn.
    message_logs: BTreeMap<String, Vec<ChatMessage>>,
    /// Every labelled utterance in speaking order.
    discussion: Vec<String>,
}

impl Transcript {
    /// Empty transcript for agents in team order.
    pub fn new<I, S>(agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_logs(agents.into_iter().map(AgentLog::new).collect())
    }

    /// Transcript over existing logs; the discussion is left empty.
    pub fn from_logs(logs: Vec<AgentLog>) -> Self {
        let message_logs = logs
            .iter()
            .map(|log| (log.agent.clone(), Vec::new()))
            .collect();
        Self {
            logs,
            message_logs,
            discussion: Vec::new(),
        }
    }

    pub fn logs(&self) -> &[AgentLog] {
        &self.logs
    }

    pub fn log(&self, agent: &str) -> Option<&AgentLog> {
        self.logs.iter().find(|log| log.agent == agent)
    }

    pub fn discussion(&self) -> &[String] {
        &self.discussion
    }

    pub fn message_log(&self, agent: &str) -> Option<&[ChatMessage]> {
        self.message_logs.get(agent).map(Vec::as_slice)
    }

    pub fn message_logs(&self) -> &BTreeMap<String, Vec<ChatMessage>> {
        &self.message_logs
    }

    /// Replace the agent's latest message log.
    pub fn set_message_log(&mut self, agent: &str, messages: Vec<ChatMessage>) {
        self.message_logs.insert(agent.to_string(), messages);
    }

    /// Append an utterance to its speaker's log and to the discussion.
    pub fn record(&mut self, utterance: Utterance) -> DebateResult<()> {
        let log = self
            .logs
            .iter_mut()
            .find(|log| log.agent == utterance.agent)
            .ok_or_else(|| DebateError::view(&utterance.agent, "agent has no log in transcript"))?;
        self.discussion.push(utterance.labelled());
        log.utterances.push(utterance);
        Ok(())
    }
}

/// Message list that coalesces adjacent same-role content.
#[derive(Debug, Default)]
struct MessageSequence {
    messages: Vec<ChatMessage>,
}

impl MessageSequence {
    fn push(&mut self, role: Role, content: String) {
        match self.messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push('\n');
                last.content.push_str(&content);
            }
            _ => self.messages.push(ChatMessage::new(role, content)),
        }
    }

    fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

/// Question text: heard lines, separator, task prompt; or the bare prompt.
fn question(heard: &[String], task_prompt: &str) -> String {
    if heard.is_empty() {
        task_prompt.to_string()
    } else {
        format!("{}{SEPARATOR}{task_prompt}", heard.join("\n"))
    }
}

/// Assemble the messages `agent` sends on its next turn.
///
/// Utterances are replayed in turn order. Whatever other agents said between
/// two of the agent's own turns forms one question, ordered by round and then
/// team order.
pub fn build_view(
    system_text: &str,
    task_prompt: &str,
    agent: &str,
    transcript: &Transcript,
) -> DebateResult<Vec<ChatMessage>> {
    let own_idx = transcript
        .logs()
        .iter()
        .position(|log| log.agent == agent)
        .ok_or_else(|| DebateError::view(agent, "agent has no log in transcript"))?;
    let own = &transcript.logs()[own_idx];
    if let Some(stray) = own.utterances().iter().find(|u| u.agent != agent) {
        return Err(DebateError::view(
            agent,
            format!("turn {} is attributed to {}", stray.turn, stray.agent),
        ));
    }

    // (team index, utterance) in turn order.
    let mut timeline: Vec<(usize, &Utterance)> = transcript
        .logs()
        .iter()
        .enumerate()
        .flat_map(|(idx, log)| log.utterances().iter().map(move |u| (idx, u)))
        .collect();
    timeline.sort_by_key(|(_, u)| u.turn);

    let mut seq = MessageSequence::default();
    seq.push(Role::System, format!("You are {agent}. {system_text}"));

    let mut pending: Vec<(usize, &Utterance)> = Vec::new();
    for (idx, u) in timeline {
        if idx == own_idx {
            seq.push(Role::User, question(&drain_heard(&mut pending), task_prompt));
            seq.push(Role::Assistant, u.text.trim_start().to_string());
        } else {
            pending.push((idx, u));
        }
    }
    seq.push(Role::User, question(&drain_heard(&mut pending), task_prompt));

    Ok(seq.into_messages())
}

/// Labelled lines of `pending` by round, then team order; empties `pending`.
fn drain_heard(pending: &mut Vec<(usize, &Utterance)>) -> Vec<String> {
    pending.sort_by_key(|(idx, u)| (u.round, *idx, u.turn));
    pending.drain(..).map(|(_, u)| u.labelled()).collect()
}

//! Session phases and legal transition guards for a team kickoff.
//!
//! ```text
//! NotStarted → InProgress(0) → InProgress(1) → … → Completed
//!                   │                 │
//!                   └──── Aborted ────┘
//! ```
//!
//! Every transition is recorded so a run can be audited after the fact.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::DebateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    /// Turn `turn` (0-based) is being produced.
    InProgress { turn: usize },
    /// Every turn ran; terminal.
    Completed,
    /// A turn or sweep failed; terminal.
    Aborted,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::InProgress { turn } => write!(f, "InProgress({turn})"),
            Self::Completed => write!(f, "Completed"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

fn is_legal_transition(from: SessionPhase, to: SessionPhase) -> bool {
    use SessionPhase::*;

    if to == Aborted && !from.is_terminal() {
        return true;
    }

    match (from, to) {
        (NotStarted, InProgress { turn }) => turn == 0,
        (InProgress { turn: a }, InProgress { turn: b }) => b == a + 1,
        (InProgress { .. }, Completed) => true,
        _ => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: SessionPhase,
    pub to: SessionPhase,
    /// Milliseconds since the session was created.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Phase tracker owned by a `Team`.
#[derive(Debug)]
pub struct Session {
    current: SessionPhase,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            current: SessionPhase::NotStarted,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> SessionPhase {
        self.current
    }

    pub fn advance(&mut self, to: SessionPhase, reason: Option<&str>) -> Result<(), DebateError> {
        if !is_legal_transition(self.current, to) {
            return Err(DebateError::IllegalTransition {
                from: self.current,
                to,
            });
        }

        tracing::debug!(from = %self.current, to = %to, "Session transition");

        self.transitions.push(TransitionRecord {
            from: self.current,
            to,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        });
        self.current = to;
        Ok(())
    }

    /// Move to `Aborted`; a no-op once terminal.
    pub fn abort(&mut self, reason: &str) {
        if !self.current.is_terminal() {
            let _ = self.advance(SessionPhase::Aborted, Some(reason));
        }
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

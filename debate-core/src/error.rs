//! Error taxonomy for debate sessions.
//!
//! | Variant            | Raised by            | Effect on the session          |
//! |--------------------|----------------------|--------------------------------|
//! | `Configuration`    | `Team::kickoff`, `Belief::new` | rejected before any turn |
//! | `ViewAssembly`     | transcript view      | aborts                         |
//! | `Completion`       | `Agent::respond/eval`| aborts, no retry in the core   |
//! | `IllegalTransition`| session phases       | aborts                         |
//!
//! A malformed belief update is not a `DebateError`: it surfaces as
//! [`BeliefParseFailure`] and is recovered inside `Agent::eval`.

use thiserror::Error;

use crate::session::SessionPhase;

/// Errors from the completion capability.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Request(String),

    /// Provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Provider answered but produced no text.
    #[error("empty response from model {0}")]
    EmptyResponse(String),
}

/// Errors that abort a debate session.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cannot assemble view for {agent}: {reason}")]
    ViewAssembly { agent: String, reason: String },

    #[error("Completion failed for {agent}: {source}")]
    Completion {
        agent: String,
        #[source]
        source: CompletionError,
    },

    #[error("Illegal session transition: {from} → {to}")]
    IllegalTransition { from: SessionPhase, to: SessionPhase },
}

impl DebateError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn view(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ViewAssembly {
            agent: agent.into(),
            reason: reason.into(),
        }
    }
}

/// A structured belief update could not be decoded or validated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BeliefParseFailure {
    #[error("no JSON object found in response")]
    NoJson,

    #[error("malformed belief update: {0}")]
    Malformed(String),

    #[error("updated strength {0} outside 1..=5")]
    OutOfRange(i64),
}

pub type DebateResult<T> = Result<T, DebateError>;

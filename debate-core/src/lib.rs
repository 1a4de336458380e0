//! Multi-agent debate engine.
//!
//! This library provides:
//! - Turn scheduling across rounds from a repeating speaking pattern
//! - Per-agent transcript views: who said what, heard exactly once, in a stable order
//! - Belief tracking with periodic structured re-scoring
//! - Structured discussion and belief-change records
//!
//! Text generation is a collaborator: implement [`Completion`] and hand each
//! [`Agent`] an `Arc<dyn Completion>`.
//!
//! ```text
//! generate_order(pattern, rounds)
//!   → Team::kickoff
//!       for each turn: Agent::respond → build_view → Completion::complete
//!                      record into Transcript + DiscussionRecord
//!       at checkpoints (belief strategy): Agent::eval for every agent
//!   → KickoffOutcome { discussion, belief_changes, transcript }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod agent;
pub mod belief;
pub mod completion;
pub mod error;
pub mod order;
pub mod prompts;
pub mod record;
pub mod session;
pub mod team;
pub mod transcript;

pub use agent::{Agent, AgentReply, BeliefRevision};
pub use belief::{
    belief_response_format, format_beliefs, parse_belief_update, Belief, BeliefUpdate,
    FAILED_STRENGTH, MAX_STRENGTH, MIN_STRENGTH,
};
pub use completion::{
    ChatMessage, Completion, CompletionRequest, CompletionResponse, ResponseFormat, Role,
    TokenUsage,
};
pub use error::{BeliefParseFailure, CompletionError, DebateError, DebateResult};
pub use order::{checkpoint_due, generate_order, round_of};
pub use record::{round_label, BeliefChangeLog, DiscussionRecord, TurnOutput, INITIAL_CHECKPOINT};
pub use session::{Session, SessionPhase, TransitionRecord};
pub use team::{KickoffOutcome, Strategy, Team};
pub use transcript::{build_view, AgentLog, Transcript, Utterance, SEPARATOR};

//! Team scheduler: drives turns across rounds and belief checkpoints.
//!
//! Agents speak in `pattern` order within each round. Belief sweeps, when the
//! strategy asks for them, visit agents in team-list order instead.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};

use crate::agent::Agent;
use crate::error::{DebateError, DebateResult};
use crate::order::{checkpoint_due, generate_order, round_of};
use crate::record::{round_label, BeliefChangeLog, DiscussionRecord, TurnOutput, INITIAL_CHECKPOINT};
use crate::session::{Session, SessionPhase, TransitionRecord};
use crate::transcript::{Transcript, Utterance};

/// How a team runs its discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Turns only.
    #[default]
    #[serde(alias = "standard")]
    Efficient,
    /// Turns plus periodic belief-revision sweeps.
    Belief,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Efficient => write!(f, "efficient"),
            Self::Belief => write!(f, "belief"),
        }
    }
}

impl FromStr for Strategy {
    type Err = DebateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "efficient" | "standard" => Ok(Self::Efficient),
            "belief" => Ok(Self::Belief),
            other => Err(DebateError::config(format!("unknown strategy: {other}"))),
        }
    }
}

/// Everything a finished kickoff produced.
#[derive(Debug, Clone)]
pub struct KickoffOutcome {
    pub discussion: DiscussionRecord,
    /// Only the `"Initial"` snapshot unless the strategy is `Belief`.
    pub belief_changes: BeliefChangeLog,
    /// Final logs, including each agent's last message log.
    pub transcript: Transcript,
}

pub struct Team {
    agents: Vec<Agent>,
    pattern: Vec<usize>,
    strategy: Strategy,
    session: Session,
}

impl Team {
    pub fn new(agents: Vec<Agent>, pattern: Vec<usize>, strategy: Strategy) -> Self {
        Self {
            agents,
            pattern,
            strategy,
            session: Session::new(),
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn pattern(&self) -> &[usize] {
        &self.pattern
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.current()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        self.session.transitions()
    }

    fn validate(&self, rounds: usize, eval_rate: usize) -> DebateResult<()> {
        if self.phase() != SessionPhase::NotStarted {
            return Err(DebateError::config(format!(
                "team already kicked off (phase {})",
                self.phase()
            )));
        }
        if self.agents.is_empty() {
            return Err(DebateError::config("team has no agents"));
        }
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.name()) {
                return Err(DebateError::config(format!(
                    "duplicate agent name: {}",
                    agent.name()
                )));
            }
        }
        if self.pattern.is_empty() {
            return Err(DebateError::config("speaking pattern is empty"));
        }
        if let Some(bad) = self.pattern.iter().find(|i| **i >= self.agents.len()) {
            return Err(DebateError::config(format!(
                "pattern index {bad} out of range for {} agents",
                self.agents.len()
            )));
        }
        if rounds == 0 {
            return Err(DebateError::config("rounds must be at least 1"));
        }
        if eval_rate == 0 {
            return Err(DebateError::config("eval_rate must be at least 1"));
        }
        Ok(())
    }

    /// Run the whole discussion.
    ///
    /// Any failed completion call aborts the run; the team is left in
    /// [`SessionPhase::Aborted`].
    pub async fn kickoff(
        &mut self,
        system_text: &str,
        task_prompt: &str,
        rounds: usize,
        eval_rate: usize,
    ) -> DebateResult<KickoffOutcome> {
        self.validate(rounds, eval_rate)?;

        let span = info_span!(
            "kickoff",
            agents = self.agents.len(),
            rounds,
            strategy = %self.strategy
        );
        match self
            .run(system_text, task_prompt, rounds, eval_rate)
            .instrument(span)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.session.abort(&e.to_string());
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        system_text: &str,
        task_prompt: &str,
        rounds: usize,
        eval_rate: usize,
    ) -> DebateResult<KickoffOutcome> {
        let order = generate_order(&self.pattern, rounds);
        let pattern_len = self.pattern.len();
        let mut transcript = Transcript::new(self.agents.iter().map(|a| a.name().to_string()));
        let mut discussion = DiscussionRecord::new();
        let mut belief_changes = BeliefChangeLog::new();

        for agent in &self.agents {
            belief_changes.snapshot(agent.name(), INITIAL_CHECKPOINT, agent.beliefs());
        }

        for (turn, &speaker) in order.iter().enumerate() {
            self.session
                .advance(SessionPhase::InProgress { turn }, None)?;
            let round = round_of(turn, pattern_len);
            let agent = &self.agents[speaker];

            let reply = agent
                .respond(system_text, task_prompt, &mut transcript)
                .await?;
            info!(
                turn,
                round,
                agent = %reply.agent,
                prompt_tokens = reply.usage.prompt_token,
                generated_tokens = reply.usage.generated_token,
                "Turn complete"
            );

            discussion.record(
                round,
                &reply.agent,
                TurnOutput::new(reply.text.trim_start(), reply.usage),
            );
            transcript.record(Utterance {
                agent: reply.agent,
                turn,
                round,
                text: reply.text,
                usage: reply.usage,
            })?;

            if self.strategy == Strategy::Belief
                && checkpoint_due(turn, pattern_len, eval_rate, order.len())
            {
                let label = round_label(round);
                for agent in self.agents.iter_mut() {
                    let revision = agent.eval(transcript.discussion()).await?;
                    info!(
                        agent = %revision.agent,
                        checkpoint = %label,
                        failed = revision.failed_updates(),
                        "Beliefs evaluated\n{revision}"
                    );
                    belief_changes.snapshot(agent.name(), &label, agent.beliefs());
                }
            }

            if (turn + 1) % pattern_len == 0 {
                info!(round, "End of round");
            }
        }

        self.session.advance(SessionPhase::Completed, None)?;
        Ok(KickoffOutcome {
            discussion,
            belief_changes,
            transcript,
        })
    }
}

impl fmt::Debug for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Team")
            .field("agents", &self.agents)
            .field("pattern", &self.pattern)
            .field("strategy", &self.strategy)
            .field("phase", &self.phase())
            .finish()
    }
}

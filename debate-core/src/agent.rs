//! Debate participant: identity, persona, beliefs, and a bound model.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::belief::{belief_response_format, format_beliefs, parse_belief_update, Belief};
use crate::completion::{ChatMessage, Completion, CompletionRequest, TokenUsage};
use crate::error::{DebateError, DebateResult};
use crate::prompts::belief_eval_prompt;
use crate::transcript::{build_view, Transcript};

/// What an agent produced on one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub agent: String,
    /// Generated text as returned by the model.
    pub text: String,
    pub usage: TokenUsage,
}

impl AgentReply {
    /// `"{agent}: {text}"`.
    pub fn labelled(&self) -> String {
        format!("{}: {}", self.agent, self.text)
    }
}

/// Before/after snapshot of one `eval` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeliefRevision {
    pub agent: String,
    pub before: Vec<Belief>,
    pub after: Vec<Belief>,
}

impl BeliefRevision {
    /// Beliefs whose update could not be parsed this round.
    pub fn failed_updates(&self) -> usize {
        self.after.iter().filter(|b| b.is_failed()).count()
    }
}

impl fmt::Display for BeliefRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n\nStarting Beliefs:\n{}\n\nUpdated Beliefs:\n{}",
            self.agent,
            format_beliefs(&self.before),
            format_beliefs(&self.after)
        )
    }
}

pub struct Agent {
    name: String,
    persona: String,
    beliefs: Vec<Belief>,
    model: String,
    completion: Arc<dyn Completion>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        persona: impl Into<String>,
        beliefs: Vec<Belief>,
        model: impl Into<String>,
        completion: Arc<dyn Completion>,
    ) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
            beliefs,
            model: model.into(),
            completion,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn beliefs(&self) -> &[Belief] {
        &self.beliefs
    }

    pub fn format_beliefs(&self) -> String {
        format_beliefs(&self.beliefs)
    }

    pub fn describe(&self) -> String {
        format!(
            "Name: {}\nPersona: {}\nModel: {}\nbeliefs: {}\n",
            self.name,
            self.persona,
            self.model,
            self.format_beliefs()
        )
    }

    /// Produce this agent's next utterance.
    ///
    /// The assembled messages replace the agent's entry in the transcript's
    /// message logs before the model is called.
    pub async fn respond(
        &self,
        system_text: &str,
        task_prompt: &str,
        transcript: &mut Transcript,
    ) -> DebateResult<AgentReply> {
        let messages = build_view(system_text, task_prompt, &self.name, transcript)?;
        debug!(agent = %self.name, messages = messages.len(), "Assembled view");
        transcript.set_message_log(&self.name, messages.clone());

        let response = self
            .completion
            .complete(CompletionRequest::text(&self.model, messages))
            .await
            .map_err(|source| DebateError::Completion {
                agent: self.name.clone(),
                source,
            })?;

        Ok(AgentReply {
            agent: self.name.clone(),
            text: response.text,
            usage: response.usage,
        })
    }

    /// Re-score every belief against the discussion so far.
    ///
    /// Each belief gets its own structured call. An answer that cannot be
    /// parsed sets that belief to the failed sentinel and evaluation moves on;
    /// a failed call aborts.
    pub async fn eval(&mut self, discussion: &[String]) -> DebateResult<BeliefRevision> {
        let before = self.beliefs.clone();
        let text_discussion = discussion.join("\n");

        for i in 0..self.beliefs.len() {
            let system = format!(
                "Persona: You are {}. {}\nCurrent Beliefs: {}",
                self.name,
                self.persona,
                format_beliefs(&self.beliefs)
            );
            let belief = &self.beliefs[i];
            let user = belief_eval_prompt(&text_discussion, belief.statement(), belief.strength());
            let request = CompletionRequest::structured(
                &self.model,
                vec![ChatMessage::system(system), ChatMessage::user(user)],
                belief_response_format(),
            );

            let response = self.completion.complete(request).await.map_err(|source| {
                DebateError::Completion {
                    agent: self.name.clone(),
                    source,
                }
            })?;

            let outcome = parse_belief_update(&response.text);
            if let Err(e) = &outcome {
                warn!(
                    agent = %self.name,
                    belief = %self.beliefs[i].statement(),
                    error = %e,
                    "Belief update unusable, marking as failed"
                );
            }
            self.beliefs[i].revise(&outcome);
        }

        Ok(BeliefRevision {
            agent: self.name.clone(),
            before,
            after: self.beliefs.clone(),
        })
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("persona", &self.persona)
            .field("beliefs", &self.beliefs)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionResponse, MockCompletion, Role};
    use crate::error::CompletionError;

    fn reply(text: &str) -> Result<CompletionResponse, CompletionError> {
        Ok(CompletionResponse {
            text: text.to_string(),
            usage: TokenUsage {
                prompt_token: 11,
                generated_token: 7,
            },
        })
    }

    fn beliefs() -> Vec<Belief> {
        vec![
            Belief::new("Hard work drives success", 4).unwrap(),
            Belief::new("Luck matters little", 3).unwrap(),
        ]
    }

    #[tokio::test]
    async fn respond_labels_reply_and_logs_messages() {
        let mut mock = MockCompletion::new();
        mock.expect_complete()
            .withf(|req| {
                req.model == "llama"
                    && req.response_format.is_none()
                    && req.messages.len() == 2
                    && req.messages[1].content == "Pick A or B"
            })
            .times(1)
            .returning(|_| reply("A, because..."));

        let agent = Agent::new("Agent 1", "", vec![], "llama", Arc::new(mock));
        let mut transcript = Transcript::new(["Agent 1", "Agent 2"]);
        let out = agent
            .respond("Be brief.", "Pick A or B", &mut transcript)
            .await
            .unwrap();

        assert_eq!(out.labelled(), "Agent 1: A, because...");
        assert_eq!(out.usage.prompt_token, 11);
        let logged = transcript.message_log("Agent 1").unwrap();
        assert_eq!(logged[0].role, Role::System);
        assert_eq!(logged[0].content, "You are Agent 1. Be brief.");
    }

    #[tokio::test]
    async fn respond_propagates_completion_failure() {
        let mut mock = MockCompletion::new();
        mock.expect_complete()
            .returning(|_| Err(CompletionError::Request("connection refused".into())));

        let agent = Agent::new("Agent 1", "", vec![], "llama", Arc::new(mock));
        let mut transcript = Transcript::new(["Agent 1"]);
        let err = agent
            .respond("s", "p", &mut transcript)
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::Completion { ref agent, .. } if agent == "Agent 1"));
    }

    #[tokio::test]
    async fn eval_updates_strength_and_keeps_statement() {
        let mut mock = MockCompletion::new();
        mock.expect_complete()
            .withf(|req| req.response_format.is_some())
            .times(2)
            .returning(|req| {
                let text = if req.messages[1].content.contains("Hard work") {
                    r#"{"belief": "rewritten!", "updated_strength": 5}"#
                } else {
                    r#"{"belief": "Luck matters little", "updated_strength": 1}"#
                };
                reply(text)
            });

        let mut agent = Agent::new("Agent 2", "skeptic", beliefs(), "gpt", Arc::new(mock));
        let revision = agent.eval(&["Agent 1: hi".to_string()]).await.unwrap();

        assert_eq!(agent.beliefs()[0].statement(), "Hard work drives success");
        assert_eq!(agent.beliefs()[0].strength(), 5);
        assert_eq!(agent.beliefs()[1].strength(), 1);
        assert_eq!(revision.before, beliefs());
        assert_eq!(revision.failed_updates(), 0);
        assert!(revision.to_string().starts_with("Agent 2\n\nStarting Beliefs:\n"));
    }

    #[tokio::test]
    async fn eval_marks_malformed_answers_failed() {
        let mut mock = MockCompletion::new();
        mock.expect_complete()
            .times(2)
            .returning(|_| reply("I think it went up a bit."));

        let mut agent = Agent::new("Agent 1", "", beliefs(), "llama", Arc::new(mock));
        let revision = agent.eval(&[]).await.unwrap();

        assert!(agent.beliefs().iter().all(Belief::is_failed));
        assert_eq!(agent.beliefs()[1].statement(), "Luck matters little");
        assert_eq!(revision.failed_updates(), 2);
    }

    #[tokio::test]
    async fn eval_prompt_carries_persona_and_discussion() {
        let mut mock = MockCompletion::new();
        mock.expect_complete()
            .withf(|req| {
                req.messages[0].content
                    == "Persona: You are Agent 3. calm\nCurrent Beliefs: Hard work drives success (4 out of 5)"
                    && req.messages[1]
                        .content
                        .contains("Discussion:\nAgent 1: x\nAgent 2: y\n")
            })
            .times(1)
            .returning(|_| reply(r#"{"belief": "b", "updated_strength": 3}"#));

        let mut agent = Agent::new(
            "Agent 3",
            "calm",
            vec![Belief::new("Hard work drives success", 4).unwrap()],
            "m",
            Arc::new(mock),
        );
        agent
            .eval(&["Agent 1: x".to_string(), "Agent 2: y".to_string()])
            .await
            .unwrap();
        assert_eq!(agent.beliefs()[0].strength(), 3);
    }

    #[tokio::test]
    async fn eval_without_beliefs_makes_no_calls() {
        let mock = MockCompletion::new();
        let mut agent = Agent::new("Agent 1", "", vec![], "m", Arc::new(mock));
        let revision = agent.eval(&["x".to_string()]).await.unwrap();
        assert!(revision.after.is_empty());
    }

    #[test]
    fn describe_lists_identity() {
        let agent = Agent::new("Agent 1", "therapist", beliefs(), "llama", Arc::new(MockCompletion::new()));
        let text = agent.describe();
        assert!(text.contains("Name: Agent 1\n"));
        assert!(text.contains("Persona: therapist\n"));
        assert!(text.contains("Hard work drives success (4 out of 5)"));
    }
}

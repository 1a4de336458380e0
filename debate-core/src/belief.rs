//! Belief store: typed `(statement, strength)` records and structured update parsing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::completion::ResponseFormat;
use crate::error::{BeliefParseFailure, DebateError};

/// Lowest strength a revision may set.
pub const MIN_STRENGTH: u8 = 1;
/// Highest strength a revision may set.
pub const MAX_STRENGTH: u8 = 5;
/// Strength recorded when a revision could not be parsed.
pub const FAILED_STRENGTH: u8 = 0;

static BRACE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("BRACE_BLOCK regex should compile"));

/// A statement an agent holds, with how strongly it holds it.
///
/// The statement is fixed at construction. Strength is `1..=5`, or
/// [`FAILED_STRENGTH`] after an evaluation whose answer could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBelief")]
pub struct Belief {
    statement: String,
    strength: u8,
}

/// Wire form of a [`Belief`], checked on the way in.
#[derive(Deserialize)]
struct RawBelief {
    statement: String,
    strength: u8,
}

impl TryFrom<RawBelief> for Belief {
    type Error = DebateError;

    /// Saved logs may carry the failed sentinel; anything else must be in range.
    fn try_from(raw: RawBelief) -> Result<Self, Self::Error> {
        if raw.strength == FAILED_STRENGTH {
            return Ok(Self {
                statement: raw.statement,
                strength: FAILED_STRENGTH,
            });
        }
        Self::new(raw.statement, raw.strength)
    }
}

impl Belief {
    pub fn new(statement: impl Into<String>, strength: u8) -> Result<Self, DebateError> {
        let statement = statement.into();
        if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&strength) {
            return Err(DebateError::config(format!(
                "belief \"{statement}\" has strength {strength}, expected {MIN_STRENGTH}..={MAX_STRENGTH}"
            )));
        }
        Ok(Self {
            statement,
            strength,
        })
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn strength(&self) -> u8 {
        self.strength
    }

    /// Whether the last evaluation of this belief failed.
    pub fn is_failed(&self) -> bool {
        self.strength == FAILED_STRENGTH
    }

    /// Apply a parsed evaluation outcome.
    pub(crate) fn revise(&mut self, outcome: &Result<u8, BeliefParseFailure>) {
        self.strength = match outcome {
            Ok(strength) => *strength,
            Err(_) => FAILED_STRENGTH,
        };
    }
}

impl fmt::Display for Belief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} out of 5)", self.statement, self.strength)
    }
}

/// Render beliefs one per line, `"{statement} ({strength} out of 5)"`.
pub fn format_beliefs(beliefs: &[Belief]) -> String {
    beliefs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" \n")
}

/// Shape the evaluator must answer with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BeliefUpdate {
    /// The original belief text (must remain unchanged).
    pub belief: String,
    /// Updated belief strength ranging from 1 (weak) to 5 (strong).
    #[schemars(range(min = 1, max = 5))]
    pub updated_strength: i64,
}

/// Structured-output format for belief evaluation calls.
pub fn belief_response_format() -> ResponseFormat {
    ResponseFormat {
        name: "belief_schema".to_string(),
        schema: serde_json::json!(schemars::schema_for!(BeliefUpdate)),
    }
}

/// Decode an evaluator answer into a validated strength.
///
/// Tries the whole answer as JSON first; falls back to the outermost
/// brace-delimited block for models that wrap JSON in prose or fences.
pub fn parse_belief_update(raw: &str) -> Result<u8, BeliefParseFailure> {
    let update: BeliefUpdate = match serde_json::from_str(raw.trim()) {
        Ok(update) => update,
        Err(strict_err) => {
            let block = BRACE_BLOCK
                .find(raw)
                .ok_or(BeliefParseFailure::NoJson)?
                .as_str();
            serde_json::from_str(block).map_err(|e| {
                BeliefParseFailure::Malformed(format!("{strict_err}; fallback: {e}"))
            })?
        }
    };

    let strength = update.updated_strength;
    if !(i64::from(MIN_STRENGTH)..=i64::from(MAX_STRENGTH)).contains(&strength) {
        return Err(BeliefParseFailure::OutOfRange(strength));
    }
    Ok(strength as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_out_of_range() {
        assert!(Belief::new("x", 0).is_err());
        assert!(Belief::new("x", 6).is_err());
        let b = Belief::new("x", 5).unwrap();
        assert_eq!(b.strength(), 5);
        assert!(!b.is_failed());
    }

    #[test]
    fn parses_strict_json() {
        let raw = r#"{"belief": "Work pays off", "updated_strength": 2}"#;
        assert_eq!(parse_belief_update(raw), Ok(2));
    }

    #[test]
    fn parses_json_inside_fence() {
        let raw = "Sure! Here it is:\n```json\n{\"belief\": \"b\", \"updated_strength\": 5}\n```";
        assert_eq!(parse_belief_update(raw), Ok(5));
    }

    #[test]
    fn rejects_out_of_range_strength() {
        let raw = r#"{"belief": "b", "updated_strength": 7}"#;
        assert_eq!(parse_belief_update(raw), Err(BeliefParseFailure::OutOfRange(7)));
        let raw = r#"{"belief": "b", "updated_strength": 0}"#;
        assert_eq!(parse_belief_update(raw), Err(BeliefParseFailure::OutOfRange(0)));
    }

    #[test]
    fn rejects_prose_and_missing_fields() {
        assert_eq!(
            parse_belief_update("I would say four."),
            Err(BeliefParseFailure::NoJson)
        );
        assert!(matches!(
            parse_belief_update(r#"{"belief": "b"}"#),
            Err(BeliefParseFailure::Malformed(_))
        ));
        assert!(matches!(
            parse_belief_update(r#"{"belief": "b", "updated_strength": "high"}"#),
            Err(BeliefParseFailure::Malformed(_))
        ));
    }

    #[test]
    fn revise_keeps_statement() {
        let mut b = Belief::new("Success needs risk", 4).unwrap();
        b.revise(&Ok(2));
        assert_eq!(b.statement(), "Success needs risk");
        assert_eq!(b.strength(), 2);
        b.revise(&Err(BeliefParseFailure::NoJson));
        assert_eq!(b.statement(), "Success needs risk");
        assert!(b.is_failed());
    }

    #[test]
    fn schema_requires_both_fields() {
        let format = belief_response_format();
        assert_eq!(format.name, "belief_schema");
        let required = format.schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "belief"));
        assert!(required.iter().any(|v| v == "updated_strength"));
        let strength = &format.schema["properties"]["updated_strength"];
        assert_eq!(strength["minimum"], 1.0);
        assert_eq!(strength["maximum"], 5.0);
    }

    #[test]
    fn beliefs_format_one_per_line() {
        let beliefs = vec![Belief::new("A", 4).unwrap(), Belief::new("B", 1).unwrap()];
        assert_eq!(format_beliefs(&beliefs), "A (4 out of 5) \nB (1 out of 5)");
    }

    #[test]
    fn deserialization_checks_strength() {
        let err = serde_json::from_str::<Belief>(r#"{"statement":"x","strength":9}"#).unwrap_err();
        assert!(err.to_string().contains("strength 9"));

        let ok: Belief = serde_json::from_str(r#"{"statement":"x","strength":3}"#).unwrap();
        assert_eq!(ok, Belief::new("x", 3).unwrap());

        let failed: Belief = serde_json::from_str(r#"{"statement":"x","strength":0}"#).unwrap();
        assert!(failed.is_failed());
    }

    #[test]
    fn belief_serializes_as_statement_strength() {
        let json = serde_json::to_value(Belief::new("A", 3).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"statement": "A", "strength": 3}));
    }
}

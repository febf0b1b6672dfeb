//! Story generation contract and the shared story vocabulary types.
//!
//! The playback core never talks to the generator directly; it consumes a
//! [`StoryProvider`] that returns one installment at a time. The wire types
//! here (chunks, choices, expressions) are also the vocabulary the rest of
//! the workspace builds on.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character expressions the narrator can display while a chunk is shown.
///
/// This is a closed set; the generator is prompted to stay inside it and
/// unknown values deserialize as [`Expression::Neutral`] upstream of this
/// crate's callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    #[default]
    Neutral,
    Happy,
    Concerned,
    Proud,
    Protective,
    Surprised,
    Teaching,
    Thinking,
}

impl Expression {
    /// All expressions, in no particular order. Useful for host UIs that
    /// preload one illustration per expression.
    pub const ALL: [Expression; 8] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Concerned,
        Expression::Proud,
        Expression::Protective,
        Expression::Surprised,
        Expression::Teaching,
        Expression::Thinking,
    ];

    /// The lowercase wire name of this expression.
    pub fn as_str(&self) -> &'static str {
        match self {
            Expression::Neutral => "neutral",
            Expression::Happy => "happy",
            Expression::Concerned => "concerned",
            Expression::Proud => "proud",
            Expression::Protective => "protective",
            Expression::Surprised => "surprised",
            Expression::Teaching => "teaching",
            Expression::Thinking => "thinking",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sentence-or-clause-sized unit of narration with its expression.
///
/// Chunks are immutable once received; the sequencer only ever moves an
/// index over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryChunk {
    /// The narration text displayed and spoken for this chunk.
    pub text: String,
    /// Expression the guide character shows while this chunk is active.
    #[serde(default)]
    pub expression: Expression,
}

impl StoryChunk {
    pub fn new(text: impl Into<String>, expression: Expression) -> Self {
        Self {
            text: text.into(),
            expression,
        }
    }
}

/// One of the decision options offered at the end of an installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Child-facing choice text.
    pub text: String,
    /// Whether the generator classified this option as the safe behavior.
    pub safe: bool,
    /// Score delta awarded on selection (+10 safe, 0 neutral, -5 unsafe).
    pub points: i32,
}

/// The guide character the story is narrated by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideCharacter {
    /// Display name, also the voice selector for speech synthesis.
    pub name: String,
    /// Personality trait steering the narration tone (e.g. "Courage").
    #[serde(rename = "trait")]
    pub trait_name: String,
}

/// One past decision carried in the continuation request.
///
/// The generator only receives a bounded trailing window of these, not the
/// whole transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// The chunks of the installment the decision belonged to.
    pub story: Vec<StoryChunk>,
    /// The choice the player committed.
    pub decision: Choice,
}

/// Request for the next story installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRequest {
    /// Selected interest themes (typically one).
    pub interests: Vec<String>,
    /// Guide character narrating the story.
    pub character: GuideCharacter,
    /// Trailing window of prior decisions; empty for a fresh story.
    #[serde(default)]
    pub decisions: Vec<DecisionRecord>,
}

/// One generated installment: ordered chunks, the decision options, and an
/// optional scene illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryResponse {
    /// Ordered narration chunks.
    pub story: Vec<StoryChunk>,
    /// Exactly three options by contract with the generator.
    pub choices: Vec<Choice>,
    /// Scene illustration URL, or `None` when synthesis failed or was
    /// skipped.
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// Contract with the story generation service.
///
/// ## Image contract
///
/// The generator attempts scene-image synthesis server-side: up to 3
/// attempts with exponential backoff starting at 5 seconds, each attempt
/// bounded by a 30 second timeout. A quota-exhausted response (HTTP 402
/// class) short-circuits the retries. In every failure case the installment
/// still arrives, with `image_url` set to `None`; callers must treat a
/// missing image as a degraded-but-valid installment, never as an error.
#[async_trait]
pub trait StoryProvider: Send + Sync {
    /// Generate the next installment.
    ///
    /// # Errors
    ///
    /// Returns an error when the service is unreachable or answers with a
    /// non-success status. Generation failures are terminal for the current
    /// story; the playback core does not retry them.
    async fn next_installment(&self, request: StoryRequest) -> Result<StoryResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_wire_names_round_trip() {
        for expression in Expression::ALL {
            let json = serde_json::to_string(&expression).unwrap();
            assert_eq!(json, format!("\"{}\"", expression.as_str()));
            let back: Expression = serde_json::from_str(&json).unwrap();
            assert_eq!(back, expression);
        }
    }

    #[test]
    fn chunk_expression_defaults_to_neutral() {
        let chunk: StoryChunk = serde_json::from_str(r#"{"text":"Hello there."}"#).unwrap();
        assert_eq!(chunk.expression, Expression::Neutral);
    }

    #[test]
    fn story_response_uses_camel_case_image_url() {
        let json = r#"{
            "story": [{"text": "Once upon a time.", "expression": "happy"}],
            "choices": [
                {"text": "Ask an adult", "safe": true, "points": 10},
                {"text": "Wait and see", "safe": false, "points": 0},
                {"text": "Go alone", "safe": false, "points": -5}
            ],
            "imageUrl": null
        }"#;
        let response: StoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.story.len(), 1);
        assert_eq!(response.choices.len(), 3);
        assert!(response.image_url.is_none());
    }
}

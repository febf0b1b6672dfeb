//! Speech synthesis contract.

use crate::error::Result;
use crate::story::Expression;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single utterance to synthesize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Narration text to speak. Implementations may sanitize it further
    /// (e.g. punctuation stripping) before handing it to the engine.
    pub text: String,
    /// Voice selector, usually a guide character name.
    #[serde(rename = "characterName")]
    pub voice: String,
    /// Expression hint for engines that support emotional coloring.
    #[serde(default)]
    pub expression: Expression,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            expression: Expression::Neutral,
        }
    }

    /// Set the expression hint.
    pub fn with_expression(mut self, expression: Expression) -> Self {
        self.expression = expression;
        self
    }
}

/// Contract with the text-to-speech backend.
///
/// Synthesis may take hundreds of milliseconds to seconds; callers are
/// expected to prefetch ahead of playback and to drop the returned future
/// to abandon a request they no longer need.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one utterance and return the complete playable clip.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unreachable, answers with a
    /// non-success status, or produces an empty clip. Callers treat any
    /// error as "this text stays text-only"; there is no automatic retry.
    async fn synthesize(&self, request: SpeechRequest) -> Result<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_voice_as_character_name() {
        let request = SpeechRequest::new("Watch out!", "Luna the Explorer")
            .with_expression(Expression::Concerned);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["characterName"], "Luna the Explorer");
        assert_eq!(json["expression"], "concerned");
    }
}

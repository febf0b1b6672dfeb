//! Text-to-speech HTTP client.
//!
//! Posts `{ text, characterName, expression }` and streams the synthesized
//! clip back into one `Bytes` buffer.
//!
//! Two quirks of the speech backend are handled here so the playback core
//! never sees them:
//!
//! - Periods are stripped from the text before sending; the engine renders
//!   them as long unnatural pauses.
//! - Rio the Nature Guide has no voice of his own (a parrot does not get a
//!   recording session) and borrows Luna the Explorer's.

use crate::{status_error, transport_error, AUTH_HEADER};
use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::speech::{SpeechRequest, SpeechSynthesizer};
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use tracing::{debug, instrument};

const RIO_VOICE: &str = "Rio the Nature Guide";
const LUNA_VOICE: &str = "Luna the Explorer";

/// Speech synthesis over HTTP.
pub struct TtsClient {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl TtsClient {
    /// Create a client posting to the given endpoint (e.g.
    /// `https://host/api/tts`).
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            auth_token: None,
        }
    }

    /// Attach the session auth token sent with every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsClient {
    #[instrument(skip(self, request), fields(voice = %request.voice))]
    async fn synthesize(&self, request: SpeechRequest) -> Result<Bytes> {
        let payload = SpeechRequest {
            text: sanitize_text(&request.text),
            voice: alias_voice(&request.voice).to_string(),
            expression: request.expression,
        };

        let mut builder = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.auth_token {
            builder = builder.header(AUTH_HEADER, token);
        }
        let response = builder.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let mut clip = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.try_next().await.map_err(transport_error)? {
            clip.extend_from_slice(&chunk);
        }
        if clip.is_empty() {
            return Err(BridgeError::OperationFailed(
                "speech service returned an empty clip".into(),
            ));
        }
        debug!(bytes = clip.len(), "synthesized clip received");
        Ok(clip.freeze())
    }
}

/// Strip periods so the engine does not render them as pauses.
fn sanitize_text(text: &str) -> String {
    text.replace('.', "")
}

/// Voice aliasing for characters without a recorded voice.
fn alias_voice(voice: &str) -> &str {
    if voice == RIO_VOICE {
        LUNA_VOICE
    } else {
        voice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::story::Expression;

    #[test]
    fn strips_periods_only() {
        assert_eq!(
            sanitize_text("Luna stopped. She looked around. Okay!"),
            "Luna stopped She looked around Okay!"
        );
        assert_eq!(sanitize_text("No periods here?"), "No periods here?");
    }

    #[test]
    fn rio_borrows_lunas_voice() {
        assert_eq!(alias_voice(RIO_VOICE), LUNA_VOICE);
        assert_eq!(alias_voice(LUNA_VOICE), LUNA_VOICE);
        assert_eq!(alias_voice("Max the Brave"), "Max the Brave");
    }

    #[test]
    fn payload_carries_wire_field_names() {
        let request = SpeechRequest::new(sanitize_text("Watch out. Danger!"), alias_voice(RIO_VOICE))
            .with_expression(Expression::Concerned);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "Watch out Danger!");
        assert_eq!(json["characterName"], "Luna the Explorer");
        assert_eq!(json["expression"], "concerned");
    }
}

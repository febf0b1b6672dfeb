//! # HTTP Providers
//!
//! `reqwest` implementations of the remote contracts in `bridge-traits`:
//!
//! - [`TtsClient`](tts::TtsClient) - speech synthesis (`/api/tts` shape)
//! - [`StoryClient`](story::StoryClient) - installment generation
//!   (`/api/generate-story` shape)
//! - [`StatsClient`](stats::StatsClient) - progress and achievements
//!   (`/api/achievements/update-stats` shape)
//!
//! All three clients share one [`reqwest::Client`] (connection pooling)
//! and authenticate with an optional `x-auth-token` header. Transport and
//! status failures are mapped onto [`BridgeError`], never panicked;
//! callers decide whether a failure degrades (speech) or ends the story
//! (generation).

pub mod stats;
pub mod story;
pub mod tts;

pub use stats::StatsClient;
pub use story::StoryClient;
pub use tts::TtsClient;

use bridge_traits::BridgeError;

/// Header carrying the session's auth token, when one is configured.
pub(crate) const AUTH_HEADER: &str = "x-auth-token";

pub(crate) fn transport_error(error: reqwest::Error) -> BridgeError {
    BridgeError::OperationFailed(format!("http transport error: {error}"))
}

/// Map a non-success response onto [`BridgeError::RemoteStatus`],
/// consuming the body as the message.
pub(crate) async fn status_error(response: reqwest::Response) -> BridgeError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    BridgeError::RemoteStatus { status, message }
}

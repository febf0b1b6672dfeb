//! Platform audio output contract.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Playback seam to the host's audio engine.
///
/// The narration controller guarantees it never runs two `play` calls
/// concurrently; implementations only ever see one active clip.
///
/// ## Cancellation
///
/// `play` resolves when the clip finishes naturally or fails to decode.
/// The controller cancels playback by dropping the future, so
/// implementations must stop audible output promptly on drop (e.g. by
/// tying the platform voice/session to a guard held across the await).
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play one complete clip to the end.
    ///
    /// # Errors
    ///
    /// Returns an error when the clip cannot be decoded or the output
    /// device rejects playback. Errors are non-fatal to the caller; they
    /// only shorten the narration for the current chunk.
    async fn play(&self, clip: Bytes) -> Result<()>;
}

//! # Session Module
//!
//! The narrated playback coordinator: chunk sequencing, typewriter reveal,
//! overlay phases, choice handling, progress tracking, and the session
//! state machine that ties them to the narration controller.
//!
//! ## Overview
//!
//! A [`PlaybackSession`] owns one story view. Hosts feed it
//! [`PlayerCommand`]s (advance, skip, toggles, choice navigation), observe
//! it through a watch stream of [`SessionSnapshot`]s, and let it talk to
//! the outside world through the `bridge-traits` contracts: a story
//! provider for installments, a speech synthesizer and audio output (via
//! `core-narration`) for narration, and a progress reporter for
//! achievements.
//!
//! The session guarantees:
//! - Exactly one playback phase is active at any instant.
//! - Feedback and loading overlays suppress and redirect narration; no
//!   fetch or play sneaks through while they are up.
//! - Rapid state changes (new installment mid-narration, skips, choice
//!   commits) never leave overlapping or orphaned audio behind.

pub mod choices;
pub mod config;
pub mod error;
pub mod expression;
pub mod model;
pub mod overlay;
pub mod progress;
pub mod sequencer;
pub mod session;
pub mod typewriter;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use model::{Feedback, Installment};
pub use session::{
    PlaybackPhase, PlaybackSession, PlayerCommand, SessionHandle, SessionSnapshot, StorySetup,
};

// Re-export the story vocabulary so hosts rarely need bridge-traits
// directly.
pub use bridge_traits::story::{Choice, Expression, GuideCharacter, StoryChunk};

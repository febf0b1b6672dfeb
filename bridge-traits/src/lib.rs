//! # Host Bridge Traits
//!
//! Contracts between the playback core and the services it consumes.
//!
//! ## Overview
//!
//! This crate defines the seams the story playback core depends on. Each
//! trait represents a capability provided by something outside the core: a
//! speech-synthesis backend, the story generator, the platform audio engine,
//! or the progress/achievement service. The core is written entirely against
//! these traits, so hosts can swap implementations (HTTP clients, embedded
//! engines, test fakes) without touching core logic.
//!
//! ## Traits
//!
//! ### Remote Services
//! - [`SpeechSynthesizer`](speech::SpeechSynthesizer) - Text-to-speech synthesis for narration
//! - [`StoryProvider`](story::StoryProvider) - Story installment generation
//! - [`ProgressReporter`](stats::ProgressReporter) - Safety-choice stats and achievements
//!
//! ### Platform Integration
//! - [`AudioOutput`](audio::AudioOutput) - Playback of synthesized clips on the host audio engine
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for
//! consistent error handling. Implementations should:
//!
//! - Convert transport- or platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., endpoint, HTTP status)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks. Implementations must ensure thread safety.

pub mod audio;
pub mod error;
pub mod speech;
pub mod stats;
pub mod story;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::AudioOutput;
pub use speech::{SpeechRequest, SpeechSynthesizer};
pub use stats::{Achievement, PlayerStats, ProgressReporter, SessionStats};
pub use story::{
    Choice, DecisionRecord, Expression, GuideCharacter, StoryChunk, StoryProvider, StoryRequest,
    StoryResponse,
};

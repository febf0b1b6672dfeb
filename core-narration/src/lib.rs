//! # Narration Module
//!
//! Speech fetching and playback for the story playback core.
//!
//! ## Overview
//!
//! This crate owns the two shared mutable resources of the narration
//! pipeline: the text-keyed audio cache and the single current-playback
//! handle. Everything else in the workspace goes through
//! [`NarrationController`]'s public operations; nothing mutates the cache or
//! the handle directly.
//!
//! Guarantees enforced here:
//! - At most one clip is audible at any instant. Starting playback for a new
//!   text stops the previous clip before the new one begins.
//! - At most one fetch is in flight per distinct text (single-flight).
//! - An aborted or superseded fetch never writes its result into the cache;
//!   completions are identity-checked against the generation they registered.
//! - While narration is suppressed, no fetch is issued and no clip is played
//!   unless the caller explicitly forces it (feedback narration does).

pub mod cache;
pub mod controller;

pub use cache::{AudioCache, CacheEntry, CacheStats};
pub use controller::{NarrationController, PlaybackOutcome};

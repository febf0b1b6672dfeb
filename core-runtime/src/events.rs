//! # Event Bus System
//!
//! Provides an event-driven architecture for the story platform core using
//! `tokio::sync::broadcast`. This module enables decoupled communication
//! between core modules through typed events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for different domains
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐     emit      ┌───────────┐
//! │ Narration Mod ├──────────────>│           │
//! └───────────────┘               │           │
//!                                 │ EventBus  │
//! ┌───────────────┐     emit      │ (broadcast│     subscribe    ┌────────────┐
//! │ Session Mod   ├──────────────>│  channel) ├─────────────────>│ Subscriber │
//! └───────────────┘               │           │                  └────────────┘
//!                                 │           │
//! ┌───────────────┐     emit      │           │     subscribe    ┌────────────┐
//! │ Story Client  ├──────────────>│           ├─────────────────>│ Subscriber │
//! └───────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, SessionEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Session(SessionEvent::ScoreChanged { score: 10 }))
//!     .ok();
//!
//! let received = stream.recv().await.unwrap();
//! assert!(matches!(received, CoreEvent::Session(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two types
//! of errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n`
//!   events. This is non-fatal; the subscriber can continue receiving.
//! - **`RecvError::Closed`**: All senders have been dropped, signaling
//!   shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// This value balances memory usage with the ability to handle bursts of
/// events. Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Narration (speech fetch/playback) events
    Narration(NarrationEvent),
    /// Playback session events
    Session(SessionEvent),
    /// Story generation events
    Story(StoryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Narration(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Story(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Story(StoryEvent::GenerationFailed { .. }) => EventSeverity::Error,
            CoreEvent::Narration(NarrationEvent::FetchFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Narration(NarrationEvent::PlaybackFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Story(StoryEvent::InstallmentArrived { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::StoryEnded { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::ChoiceCommitted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Narration Events
// ============================================================================

/// Events related to speech fetching and playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NarrationEvent {
    /// A speech fetch was issued for a text.
    FetchStarted {
        /// The narration text being synthesized.
        text: String,
    },
    /// A speech fetch completed and the clip was cached.
    FetchCompleted {
        /// The narration text.
        text: String,
        /// Clip size in bytes.
        clip_bytes: usize,
    },
    /// A speech fetch failed; the text stays text-only.
    FetchFailed {
        /// The narration text.
        text: String,
        /// Human-readable error message.
        message: String,
    },
    /// A fetch completed after it was superseded or aborted and its result
    /// was discarded without touching the cache.
    FetchDiscarded {
        /// The narration text.
        text: String,
    },
    /// Playback of a clip started.
    PlaybackStarted {
        /// The narration text being spoken.
        text: String,
    },
    /// Playback finished naturally.
    PlaybackCompleted {
        /// The narration text.
        text: String,
    },
    /// Playback was stopped before completion.
    PlaybackStopped {
        /// The narration text.
        text: String,
    },
    /// Playback failed to decode or output.
    PlaybackFailed {
        /// The narration text.
        text: String,
        /// Human-readable error message.
        message: String,
    },
    /// The global narration suppression flag changed.
    SuppressionChanged {
        /// New suppression state.
        suppressed: bool,
    },
}

impl NarrationEvent {
    fn description(&self) -> &str {
        match self {
            NarrationEvent::FetchStarted { .. } => "Speech fetch started",
            NarrationEvent::FetchCompleted { .. } => "Speech fetch completed",
            NarrationEvent::FetchFailed { .. } => "Speech fetch failed",
            NarrationEvent::FetchDiscarded { .. } => "Stale speech fetch discarded",
            NarrationEvent::PlaybackStarted { .. } => "Narration playback started",
            NarrationEvent::PlaybackCompleted { .. } => "Narration playback completed",
            NarrationEvent::PlaybackStopped { .. } => "Narration playback stopped",
            NarrationEvent::PlaybackFailed { .. } => "Narration playback failed",
            NarrationEvent::SuppressionChanged { .. } => "Narration suppression changed",
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Events related to the playback session state machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// The session phase changed.
    PhaseChanged {
        /// Previous phase name.
        from: String,
        /// New phase name.
        to: String,
    },
    /// A chunk started typing.
    ChunkStarted {
        /// Zero-based chunk index.
        index: usize,
        /// Total chunks in the installment.
        total: usize,
    },
    /// A chunk's full text became visible (natural completion or skip).
    ChunkRevealed {
        /// Zero-based chunk index.
        index: usize,
        /// Whether the reveal was a user skip.
        skipped: bool,
    },
    /// The decision options became visible.
    ChoicesShown {
        /// Number of options offered.
        count: usize,
    },
    /// The player committed a choice.
    ChoiceCommitted {
        /// Choice text.
        text: String,
        /// Whether the choice was the safe behavior.
        safe: bool,
        /// Score delta applied.
        points: i32,
    },
    /// The running score changed.
    ScoreChanged {
        /// New score value.
        score: i32,
    },
    /// The feedback overlay appeared.
    FeedbackStarted {
        /// Whether the committed choice was safe.
        safe: bool,
    },
    /// The loading overlay appeared.
    LoadingStarted,
    /// The story reached its terminal state.
    StoryEnded {
        /// Final score shown to the player.
        final_score: i32,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::PhaseChanged { .. } => "Session phase changed",
            SessionEvent::ChunkStarted { .. } => "Chunk typing started",
            SessionEvent::ChunkRevealed { .. } => "Chunk fully revealed",
            SessionEvent::ChoicesShown { .. } => "Choices shown",
            SessionEvent::ChoiceCommitted { .. } => "Choice committed",
            SessionEvent::ScoreChanged { .. } => "Score changed",
            SessionEvent::FeedbackStarted { .. } => "Feedback overlay started",
            SessionEvent::LoadingStarted => "Loading overlay started",
            SessionEvent::StoryEnded { .. } => "Story ended",
        }
    }
}

// ============================================================================
// Story Events
// ============================================================================

/// Events related to installment generation and progress reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum StoryEvent {
    /// A continuation request was issued.
    InstallmentRequested {
        /// Number of prior decisions carried in the request window.
        decision_window: usize,
    },
    /// A new installment arrived and was loaded.
    InstallmentArrived {
        /// Number of narration chunks (including synthetic suffix).
        chunk_count: usize,
        /// Whether a scene illustration was included.
        has_image: bool,
    },
    /// Story generation failed; the story cannot continue.
    GenerationFailed {
        /// Human-readable error message.
        message: String,
    },
    /// Session stats were reported to the progress service.
    StatsReported {
        /// Safe choices in the finished story.
        safe_choices: u32,
        /// Total choices in the finished story.
        total_choices: u32,
    },
}

impl StoryEvent {
    fn description(&self) -> &str {
        match self {
            StoryEvent::InstallmentRequested { .. } => "Installment requested",
            StoryEvent::InstallmentArrived { .. } => "Installment arrived",
            StoryEvent::GenerationFailed { .. } => "Story generation failed",
            StoryEvent::StatsReported { .. } => "Session stats reported",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering
/// capabilities.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let narration_stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Narration(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events. Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        let event = CoreEvent::Session(SessionEvent::LoadingStarted);

        // Should error when no subscribers
        assert!(bus.emit(event).is_err());
    }

    #[tokio::test]
    async fn test_event_emission_with_subscribers() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let event = CoreEvent::Narration(NarrationEvent::FetchStarted {
            text: "Once upon a time.".to_string(),
        });

        let result = bus.emit(event.clone());
        assert_eq!(result.unwrap(), 1);

        let received = sub.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Session(SessionEvent::ChoiceCommitted {
            text: "Ask an adult for help".to_string(),
            safe: true,
            points: 10,
        });

        bus.emit(event.clone()).ok();

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Narration(_)));

        // Emit non-narration event (should be filtered out)
        bus.emit(CoreEvent::Session(SessionEvent::LoadingStarted))
            .ok();

        // Emit narration event (should pass through)
        let narration_event = CoreEvent::Narration(NarrationEvent::PlaybackCompleted {
            text: "The end.".to_string(),
        });
        bus.emit(narration_event.clone()).ok();

        let received = stream.recv().await.unwrap();
        assert_eq!(received, narration_event);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2); // Very small buffer
        let mut sub = bus.subscribe();

        for score in 0..5 {
            bus.emit(CoreEvent::Session(SessionEvent::ScoreChanged { score }))
                .ok();
        }

        // First recv should indicate lagging
        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn test_event_severity() {
        let error_event = CoreEvent::Story(StoryEvent::GenerationFailed {
            message: "Service unavailable".to_string(),
        });
        assert_eq!(error_event.severity(), EventSeverity::Error);

        let warning_event = CoreEvent::Narration(NarrationEvent::FetchFailed {
            text: "Hello.".to_string(),
            message: "timeout".to_string(),
        });
        assert_eq!(warning_event.severity(), EventSeverity::Warning);

        let debug_event = CoreEvent::Session(SessionEvent::ChunkStarted { index: 0, total: 4 });
        assert_eq!(debug_event.severity(), EventSeverity::Debug);
    }

    #[tokio::test]
    async fn test_event_serialization() {
        let event = CoreEvent::Story(StoryEvent::InstallmentArrived {
            chunk_count: 7,
            has_image: false,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("InstallmentArrived"));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());

        assert!(stream.try_recv().is_none());
    }
}

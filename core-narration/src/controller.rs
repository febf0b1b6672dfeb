//! # Narration Controller
//!
//! Owns the audio cache, the in-flight fetch registry, and the single
//! current-playback handle. All narration in the workspace flows through
//! this type.
//!
//! ## Lifecycle
//!
//! One controller is created per story view and torn down with it. Loading
//! a new installment calls [`NarrationController::reset`], which stops
//! playback, aborts every pending fetch, and discards the cache, so no
//! audio from the previous installment can surface later.
//!
//! ## Cancellation
//!
//! Every fetch registers a generation in the cache and holds a
//! `CancellationToken` in the in-flight registry. Aborts cancel the token;
//! the fetch task re-checks its generation before committing, so a
//! completion that lost the race is discarded instead of poisoning the
//! cache. Playback is cancelled by dropping the platform future, which
//! implementations are required to treat as an immediate stop.

use crate::cache::{AudioCache, CacheStats};
use bridge_traits::speech::{SpeechRequest, SpeechSynthesizer};
use bridge_traits::story::Expression;
use bridge_traits::AudioOutput;
use core_runtime::events::{CoreEvent, EventBus, NarrationEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// How one `play` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The clip played to its natural end.
    Completed,
    /// Playback was stopped before completion (new playback, phase change,
    /// or explicit stop).
    Stopped,
    /// The platform failed to play the clip.
    Failed,
    /// No playable clip exists for this text (never fetched, still
    /// fetching, or fetch failed).
    Unavailable,
    /// Narration is suppressed and the call was not forced.
    Suppressed,
}

impl PlaybackOutcome {
    /// Returns `true` only for a natural completion. Callers use this to
    /// pick the shorter post-narration delay.
    pub fn finished_naturally(&self) -> bool {
        matches!(self, PlaybackOutcome::Completed)
    }
}

struct InflightFetch {
    generation: u64,
    token: CancellationToken,
}

struct ActivePlayback {
    id: u64,
    token: CancellationToken,
    /// Notified once the playback future has been dropped, i.e. the
    /// platform output is guaranteed silent.
    released: Arc<Notify>,
}

/// Coordinates speech fetching and exclusive playback for one story view.
pub struct NarrationController {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output: Arc<dyn AudioOutput>,
    voice: String,
    cache: Arc<Mutex<AudioCache>>,
    inflight: Arc<Mutex<HashMap<String, InflightFetch>>>,
    current: Arc<Mutex<Option<ActivePlayback>>>,
    suppressed: Arc<AtomicBool>,
    speaking: Arc<AtomicBool>,
    fetch_seq: Arc<AtomicU64>,
    play_seq: Arc<AtomicU64>,
    event_bus: Option<EventBus>,
}

impl NarrationController {
    /// Create a controller speaking with the given voice.
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: Arc<dyn AudioOutput>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            synthesizer,
            output,
            voice: voice.into(),
            cache: Arc::new(Mutex::new(AudioCache::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            current: Arc::new(Mutex::new(None)),
            suppressed: Arc::new(AtomicBool::new(false)),
            speaking: Arc::new(AtomicBool::new(false)),
            fetch_seq: Arc::new(AtomicU64::new(0)),
            play_seq: Arc::new(AtomicU64::new(0)),
            event_bus: None,
        }
    }

    /// Attach an event bus for narration events.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Speculatively fetch the clip for a text. No-op when a clip is ready,
    /// a fetch is already in flight, a previous fetch failed, or narration
    /// is suppressed.
    pub fn prefetch(&self, text: &str, expression: Expression) {
        self.prefetch_inner(text, expression, false);
    }

    /// Fetch even while narration is suppressed. Only the feedback overlay
    /// uses this.
    pub fn prefetch_forced(&self, text: &str, expression: Expression) {
        self.prefetch_inner(text, expression, true);
    }

    fn prefetch_inner(&self, text: &str, expression: Expression, force: bool) {
        if text.is_empty() {
            return;
        }
        if self.suppressed.load(Ordering::SeqCst) && !force {
            debug!(text, "narration suppressed, skipping fetch");
            return;
        }
        let Some((request, generation, token)) = self.register_fetch(text, expression) else {
            return;
        };
        tokio::spawn(run_fetch(
            Arc::clone(&self.synthesizer),
            Arc::clone(&self.cache),
            Arc::clone(&self.inflight),
            self.event_bus.clone(),
            request,
            text.to_string(),
            generation,
            token,
        ));
    }

    /// Claim the cache entry and the in-flight slot for a new fetch. Returns
    /// `None` when the text already has an entry (ready, fetching, or
    /// failed) and no fetch should be issued.
    fn register_fetch(
        &self,
        text: &str,
        expression: Expression,
    ) -> Option<(SpeechRequest, u64, CancellationToken)> {
        let generation = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut cache = self.cache.lock();
            if cache.has_entry(text) {
                return None;
            }
            cache.begin_fetch(text, generation);
        }

        let token = CancellationToken::new();
        {
            let mut inflight = self.inflight.lock();
            let replaced = inflight.insert(
                text.to_string(),
                InflightFetch {
                    generation,
                    token: token.clone(),
                },
            );
            // A superseded request for the same text must not outlive us.
            if let Some(previous) = replaced {
                previous.token.cancel();
            }
        }
        self.emit(NarrationEvent::FetchStarted {
            text: text.to_string(),
        });

        let request = SpeechRequest::new(text, self.voice.as_str()).with_expression(expression);
        Some((request, generation, token))
    }

    /// Play the cached clip for a text, stopping any current playback
    /// first. Resolves when the clip ends, fails, or is stopped.
    #[instrument(skip(self))]
    pub async fn play(&self, text: &str) -> PlaybackOutcome {
        self.play_inner(text, false).await
    }

    /// Play even while narration is suppressed. Only the feedback overlay
    /// uses this.
    #[instrument(skip(self))]
    pub async fn play_forced(&self, text: &str) -> PlaybackOutcome {
        self.play_inner(text, true).await
    }

    /// Fetch the clip if necessary, then play it, bypassing suppression.
    ///
    /// The feedback overlay uses this for its one-off utterance: the cache
    /// was just torn down, so the clip is almost never resident and a plain
    /// `play_forced` would resolve `Unavailable` before the fetch lands.
    /// If a fetch for the same text is already in flight elsewhere, this
    /// call does not wait for it.
    #[instrument(skip(self))]
    pub async fn narrate_forced(&self, text: &str, expression: Expression) -> PlaybackOutcome {
        if text.is_empty() {
            return PlaybackOutcome::Unavailable;
        }
        if !self.has_clip(text) {
            if let Some((request, generation, token)) = self.register_fetch(text, expression) {
                run_fetch(
                    Arc::clone(&self.synthesizer),
                    Arc::clone(&self.cache),
                    Arc::clone(&self.inflight),
                    self.event_bus.clone(),
                    request,
                    text.to_string(),
                    generation,
                    token,
                )
                .await;
            }
        }
        self.play_forced(text).await
    }

    async fn play_inner(&self, text: &str, force: bool) -> PlaybackOutcome {
        if self.suppressed.load(Ordering::SeqCst) && !force {
            debug!(text, "narration suppressed, skipping playback");
            return PlaybackOutcome::Suppressed;
        }
        let Some(clip) = self.cache.lock().clip(text) else {
            debug!(text, "no playable clip");
            return PlaybackOutcome::Unavailable;
        };

        let id = self.play_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let released = Arc::new(Notify::new());

        // The previous clip must be fully silent before the new one starts,
        // so wait for its future to be dropped, not just for the cancel
        // signal to be sent. Claiming the empty slot happens under the same
        // lock as the emptiness check, so two racing plays cannot both
        // install a handle; the loser finds the winner's and stops it.
        loop {
            let previous = {
                let mut current = self.current.lock();
                let taken = current.take();
                if taken.is_none() {
                    *current = Some(ActivePlayback {
                        id,
                        token: token.clone(),
                        released: Arc::clone(&released),
                    });
                }
                taken
            };
            match previous {
                None => break,
                Some(active) => {
                    active.token.cancel();
                    self.speaking.store(false, Ordering::SeqCst);
                    active.released.notified().await;
                }
            }
        }
        self.speaking.store(true, Ordering::SeqCst);
        self.emit(NarrationEvent::PlaybackStarted {
            text: text.to_string(),
        });

        let played = tokio::select! {
            _ = token.cancelled() => None,
            result = self.output.play(clip) => Some(result),
        };
        // The losing select branch is dropped here; the output is silent.
        released.notify_one();

        {
            let mut current = self.current.lock();
            if current.as_ref().is_some_and(|active| active.id == id) {
                *current = None;
                self.speaking.store(false, Ordering::SeqCst);
            }
        }

        let (outcome, event) = match played {
            None => (
                PlaybackOutcome::Stopped,
                NarrationEvent::PlaybackStopped {
                    text: text.to_string(),
                },
            ),
            Some(Ok(())) => (
                PlaybackOutcome::Completed,
                NarrationEvent::PlaybackCompleted {
                    text: text.to_string(),
                },
            ),
            Some(Err(error)) => {
                warn!(text, %error, "clip playback failed");
                (
                    PlaybackOutcome::Failed,
                    NarrationEvent::PlaybackFailed {
                        text: text.to_string(),
                        message: error.to_string(),
                    },
                )
            }
        };
        self.emit(event);
        outcome
    }

    /// Immediately halt any in-flight playback. Synchronous; the pending
    /// `play` call resolves as `Stopped`.
    ///
    /// The playback slot is cleared by the owning `play` task, not here,
    /// so a `play` issued right after a stop still finds the handle and
    /// waits for the previous future to be dropped before starting.
    pub fn stop_all(&self) {
        let current = self.current.lock();
        if let Some(active) = current.as_ref() {
            debug!("stopping current playback");
            active.token.cancel();
            self.speaking.store(false, Ordering::SeqCst);
        }
    }

    /// Cancel every outstanding fetch and free their cache markers so the
    /// texts can be fetched again later.
    pub fn abort_pending(&self) {
        let drained: Vec<(String, InflightFetch)> = self.inflight.lock().drain().collect();
        if drained.is_empty() {
            return;
        }
        debug!(count = drained.len(), "aborting pending speech fetches");
        let mut cache = self.cache.lock();
        for (text, fetch) in drained {
            fetch.token.cancel();
            cache.cancel_fetch(&text, fetch.generation);
        }
    }

    /// Tear down all narration state for the current installment: stop
    /// playback, abort fetches, discard the cache.
    pub fn reset(&self) {
        self.stop_all();
        self.abort_pending();
        self.cache.lock().invalidate_all();
    }

    /// Set the global suppression flag consulted by every non-forced fetch
    /// and play.
    pub fn set_suppressed(&self, suppressed: bool) {
        let previous = self.suppressed.swap(suppressed, Ordering::SeqCst);
        if previous != suppressed {
            self.emit(NarrationEvent::SuppressionChanged { suppressed });
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// Whether a clip is currently audible.
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Whether a playable clip is cached for the text.
    pub fn has_clip(&self, text: &str) -> bool {
        self.cache
            .lock()
            .entry(text)
            .is_some_and(crate::cache::CacheEntry::is_ready)
    }

    /// Snapshot of the cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    fn emit(&self, event: NarrationEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Narration(event)).ok();
        }
    }
}

/// Drive one registered fetch to its cache commit. Shared by the spawned
/// prefetch path and the inline feedback path; in both, the commit is
/// identity-checked against the registered generation so a fetch that lost
/// its slot discards its result.
#[allow(clippy::too_many_arguments)]
async fn run_fetch(
    synthesizer: Arc<dyn SpeechSynthesizer>,
    cache: Arc<Mutex<AudioCache>>,
    inflight: Arc<Mutex<HashMap<String, InflightFetch>>>,
    event_bus: Option<EventBus>,
    request: SpeechRequest,
    text: String,
    generation: u64,
    token: CancellationToken,
) {
    let result = tokio::select! {
        _ = token.cancelled() => None,
        result = synthesizer.synthesize(request) => Some(result),
    };

    {
        let mut inflight = inflight.lock();
        if inflight
            .get(&text)
            .is_some_and(|f| f.generation == generation)
        {
            inflight.remove(&text);
        }
    }

    let event = {
        let mut cache = cache.lock();
        match result {
            None => {
                cache.cancel_fetch(&text, generation);
                NarrationEvent::FetchDiscarded { text: text.clone() }
            }
            Some(Ok(clip)) => {
                let clip_bytes = clip.len();
                if cache.commit_ready(&text, generation, clip) {
                    NarrationEvent::FetchCompleted {
                        text: text.clone(),
                        clip_bytes,
                    }
                } else {
                    NarrationEvent::FetchDiscarded { text: text.clone() }
                }
            }
            Some(Err(error)) => {
                if cache.commit_failed(&text, generation) {
                    warn!(%text, %error, "speech fetch failed, degrading to text-only");
                    NarrationEvent::FetchFailed {
                        text: text.clone(),
                        message: error.to_string(),
                    }
                } else {
                    NarrationEvent::FetchDiscarded { text: text.clone() }
                }
            }
        }
    };

    if let Some(bus) = &event_bus {
        bus.emit(CoreEvent::Narration(event)).ok();
    }
}

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::speech::{SpeechRequest, SpeechSynthesizer};
use bridge_traits::story::Expression;
use bridge_traits::AudioOutput;
use bytes::Bytes;
use core_narration::{NarrationController, PlaybackOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Test Doubles
// ============================================================================

/// Synthesizer fake with a controllable gate and failure switch.
struct FakeSynthesizer {
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
    fail: bool,
}

impl FakeSynthesizer {
    fn immediate() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: None,
            fail: false,
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Some(gate),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: None,
            fail: true,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, request: SpeechRequest) -> BridgeResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(BridgeError::OperationFailed("synthesis failed".into()));
        }
        Ok(Bytes::from(request.text.into_bytes()))
    }
}

/// Output fake that tracks how many clips are audible at once. The playing
/// counter is decremented on drop, mirroring the stop-on-drop contract.
struct FakeOutput {
    playing: Arc<AtomicUsize>,
    max_concurrent: Arc<AtomicUsize>,
    clip_duration: Duration,
    fail: bool,
}

impl FakeOutput {
    fn new(clip_duration: Duration) -> Self {
        Self {
            playing: Arc::new(AtomicUsize::new(0)),
            max_concurrent: Arc::new(AtomicUsize::new(0)),
            clip_duration,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Duration::from_millis(10))
        }
    }

    fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

struct PlayingGuard(Arc<AtomicUsize>);

impl Drop for PlayingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn play(&self, _clip: Bytes) -> BridgeResult<()> {
        let now = self.playing.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        let _guard = PlayingGuard(Arc::clone(&self.playing));
        tokio::time::sleep(self.clip_duration).await;
        if self.fail {
            return Err(BridgeError::AudioDevice("decode error".into()));
        }
        Ok(())
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not met in time");
}

fn controller(
    synthesizer: Arc<FakeSynthesizer>,
    output: Arc<FakeOutput>,
) -> Arc<NarrationController> {
    Arc::new(NarrationController::new(
        synthesizer,
        output,
        "Luna the Explorer",
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_play_stops_previous_clip_before_new_one_starts() {
    let synthesizer = Arc::new(FakeSynthesizer::immediate());
    let output = Arc::new(FakeOutput::new(Duration::from_millis(200)));
    let ctrl = controller(Arc::clone(&synthesizer), Arc::clone(&output));

    ctrl.prefetch("first chunk", Expression::Neutral);
    ctrl.prefetch("second chunk", Expression::Neutral);
    wait_until(|| ctrl.has_clip("first chunk") && ctrl.has_clip("second chunk")).await;

    let first = tokio::spawn({
        let ctrl = Arc::clone(&ctrl);
        async move { ctrl.play("first chunk").await }
    });
    // Let the first clip become audible.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(ctrl.is_speaking());

    let second = ctrl.play("second chunk").await;

    assert_eq!(first.await.unwrap(), PlaybackOutcome::Stopped);
    assert_eq!(second, PlaybackOutcome::Completed);
    assert_eq!(output.max_concurrent(), 1, "two clips were audible at once");
    assert!(!ctrl.is_speaking());
}

#[tokio::test(start_paused = true)]
async fn test_reset_aborts_pending_fetches_and_clears_cache() {
    let gate = Arc::new(Notify::new());
    let synthesizer = Arc::new(FakeSynthesizer::gated(Arc::clone(&gate)));
    let output = Arc::new(FakeOutput::new(Duration::from_millis(10)));
    let ctrl = controller(Arc::clone(&synthesizer), output);

    ctrl.prefetch("old story chunk", Expression::Neutral);
    wait_until(|| synthesizer.calls() == 1).await;

    ctrl.reset();
    // Even if the old fetch would now resolve, nothing may reach the cache.
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!ctrl.has_clip("old story chunk"));

    // The text is fetchable again for the next installment.
    gate.notify_one();
    ctrl.prefetch("old story chunk", Expression::Neutral);
    wait_until(|| synthesizer.calls() == 2).await;
    wait_until(|| ctrl.has_clip("old story chunk")).await;
}

#[tokio::test(start_paused = true)]
async fn test_fetch_is_single_flight_per_text() {
    let gate = Arc::new(Notify::new());
    let synthesizer = Arc::new(FakeSynthesizer::gated(Arc::clone(&gate)));
    let output = Arc::new(FakeOutput::new(Duration::from_millis(10)));
    let ctrl = controller(Arc::clone(&synthesizer), output);

    ctrl.prefetch("same text", Expression::Neutral);
    ctrl.prefetch("same text", Expression::Neutral);
    ctrl.prefetch("same text", Expression::Neutral);
    wait_until(|| synthesizer.calls() >= 1).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(synthesizer.calls(), 1);

    gate.notify_one();
    wait_until(|| ctrl.has_clip("same text")).await;

    // A ready clip also blocks re-fetching.
    ctrl.prefetch("same text", Expression::Neutral);
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(synthesizer.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_suppression_blocks_fetch_and_play_unless_forced() {
    let synthesizer = Arc::new(FakeSynthesizer::immediate());
    let output = Arc::new(FakeOutput::new(Duration::from_millis(10)));
    let ctrl = controller(Arc::clone(&synthesizer), output);

    ctrl.set_suppressed(true);

    ctrl.prefetch("suppressed text", Expression::Neutral);
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(synthesizer.calls(), 0);
    assert_eq!(
        ctrl.play("suppressed text").await,
        PlaybackOutcome::Suppressed
    );

    // Feedback narration bypasses suppression explicitly.
    ctrl.prefetch_forced("Great job! That was a safe choice!", Expression::Proud);
    wait_until(|| ctrl.has_clip("Great job! That was a safe choice!")).await;
    assert_eq!(
        ctrl.play_forced("Great job! That was a safe choice!").await,
        PlaybackOutcome::Completed
    );
}

#[tokio::test(start_paused = true)]
async fn test_narrate_forced_fetches_and_plays_while_suppressed() {
    let synthesizer = Arc::new(FakeSynthesizer::immediate());
    let output = Arc::new(FakeOutput::new(Duration::from_millis(10)));
    let ctrl = controller(Arc::clone(&synthesizer), output);

    // The feedback flow: cache is empty, suppression is on, and the
    // utterance still has to go out in one call.
    ctrl.reset();
    ctrl.set_suppressed(true);

    assert_eq!(
        ctrl.narrate_forced("Let's think about that choice...", Expression::Concerned)
            .await,
        PlaybackOutcome::Completed
    );
    assert_eq!(synthesizer.calls(), 1);

    // The clip is cached afterwards, so a repeat does not re-fetch.
    assert_eq!(
        ctrl.narrate_forced("Let's think about that choice...", Expression::Concerned)
            .await,
        PlaybackOutcome::Completed
    );
    assert_eq!(synthesizer.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_degrades_to_text_only_without_retry() {
    let synthesizer = Arc::new(FakeSynthesizer::failing());
    let output = Arc::new(FakeOutput::new(Duration::from_millis(10)));
    let ctrl = controller(Arc::clone(&synthesizer), output);

    ctrl.prefetch("doomed text", Expression::Neutral);
    wait_until(|| synthesizer.calls() == 1).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(ctrl.play("doomed text").await, PlaybackOutcome::Unavailable);

    // The failure marker blocks automatic retries.
    ctrl.prefetch("doomed text", Expression::Neutral);
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(synthesizer.calls(), 1);
    assert_eq!(ctrl.cache_stats().failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_playback_error_resolves_as_failed() {
    let synthesizer = Arc::new(FakeSynthesizer::immediate());
    let output = Arc::new(FakeOutput::failing());
    let ctrl = controller(Arc::clone(&synthesizer), output);

    ctrl.prefetch("glitchy clip", Expression::Neutral);
    wait_until(|| ctrl.has_clip("glitchy clip")).await;

    assert_eq!(ctrl.play("glitchy clip").await, PlaybackOutcome::Failed);
    assert!(!ctrl.is_speaking());
}

#[tokio::test(start_paused = true)]
async fn test_play_without_clip_is_unavailable() {
    let synthesizer = Arc::new(FakeSynthesizer::immediate());
    let output = Arc::new(FakeOutput::new(Duration::from_millis(10)));
    let ctrl = controller(synthesizer, output);

    assert_eq!(ctrl.play("never fetched").await, PlaybackOutcome::Unavailable);
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_resolves_pending_play_as_stopped() {
    let synthesizer = Arc::new(FakeSynthesizer::immediate());
    let output = Arc::new(FakeOutput::new(Duration::from_millis(500)));
    let ctrl = controller(Arc::clone(&synthesizer), output);

    ctrl.prefetch("long clip", Expression::Neutral);
    wait_until(|| ctrl.has_clip("long clip")).await;

    let playing = tokio::spawn({
        let ctrl = Arc::clone(&ctrl);
        async move { ctrl.play("long clip").await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(ctrl.is_speaking());

    ctrl.stop_all();
    assert!(!ctrl.is_speaking());
    assert_eq!(playing.await.unwrap(), PlaybackOutcome::Stopped);
}

// ============================================================================
// Mock-based expectations
// ============================================================================

mockall::mock! {
    Synth {}

    #[async_trait]
    impl SpeechSynthesizer for Synth {
        async fn synthesize(&self, request: SpeechRequest) -> BridgeResult<Bytes>;
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_fetch_is_issued_while_loading_phase_suppresses() {
    let mut synthesizer = MockSynth::new();
    // Loading suppression means the synthesizer is never consulted.
    synthesizer.expect_synthesize().times(0);

    let output = Arc::new(FakeOutput::new(Duration::from_millis(10)));
    let ctrl = NarrationController::new(Arc::new(synthesizer), output, "Luna the Explorer");

    ctrl.set_suppressed(true);
    ctrl.prefetch("next part teaser", Expression::Thinking);
    ctrl.prefetch("another line", Expression::Neutral);
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(ctrl.play("next part teaser").await, PlaybackOutcome::Suppressed);
}

//! # Playback Session
//!
//! The composition root wiring the sequencer, typewriter, overlays, choice
//! presenter, progress tracking, and the narration controller into one
//! explicit state machine.
//!
//! ## Architecture
//!
//! The session runs as a single async loop with one dispatch entry point.
//! User input arrives as [`PlayerCommand`] values over an mpsc channel;
//! everything long-running (narration playback, advance delays, overlay
//! dwells, installment fetches) is spawned as a task that reports back
//! through an internal wakeup channel. All state mutation happens inside
//! the loop, so no callback can act on an index or phase that has since
//! changed.
//!
//! ```text
//! ┌──────────┐ PlayerCommand ┌─────────────────────────────┐
//! │   Host   ├──────────────>│      PlaybackSession        │
//! │ (UI/key) │               │  sequencer · typewriter     │
//! └────┬─────┘               │  overlay · choices          │
//!      │    SessionSnapshot  │  progress · phase           │
//!      │<───(watch channel)──┤                             │
//!      │                     └──────┬──────────────▲───────┘
//!      │                            │ spawn        │ Wakeup
//!      │                     ┌──────▼──────────────┴───────┐
//!      │                     │ narration / dwell timers /  │
//!      │                     │ installment fetch tasks     │
//!      │                     └─────────────────────────────┘
//! ```
//!
//! ## Staleness
//!
//! Every spawned task captures the session's current epoch. The epoch is
//! bumped on each transition that invalidates pending work (new chunk, new
//! installment, overlay entry, story end), and wakeups carrying an old
//! epoch are dropped on arrival. That makes "a late timer cannot advance a
//! story that moved on" mechanical rather than convention-based.

use crate::choices::ChoicePresenter;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::model::{Feedback, Installment};
use crate::overlay::OverlayCoordinator;
use crate::progress::SessionProgress;
use crate::sequencer::{Advance, ChunkSequencer};
use crate::typewriter::{Tick, TypewriterEngine};
use bridge_traits::stats::ProgressReporter;
use bridge_traits::story::{
    Choice, DecisionRecord, Expression, GuideCharacter, StoryProvider, StoryRequest,
};
use core_narration::{NarrationController, PlaybackOutcome};
use core_runtime::events::{CoreEvent, EventBus, SessionEvent, StoryEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// The mutually exclusive playback phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// No story loaded yet.
    #[default]
    Idle,
    /// The typewriter is revealing the current chunk.
    Typing,
    /// The chunk is fully revealed; an explicit advance is required.
    WaitingForInput,
    /// The chunk is fully revealed; the advance is scheduled.
    AutoAdvancing,
    /// The decision options are on screen.
    ChoicesVisible,
    /// The post-choice feedback overlay is up.
    Feedback,
    /// The next installment is being generated.
    Loading,
    /// The story finished; only a fresh start leaves this state.
    Ended,
}

impl PlaybackPhase {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Typing => "typing",
            PlaybackPhase::WaitingForInput => "waiting_for_input",
            PlaybackPhase::AutoAdvancing => "auto_advancing",
            PlaybackPhase::ChoicesVisible => "choices_visible",
            PlaybackPhase::Feedback => "feedback",
            PlaybackPhase::Loading => "loading",
            PlaybackPhase::Ended => "ended",
        }
    }

    /// Returns `true` for the state no event leaves without a fresh start.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackPhase::Ended)
    }
}

/// User input accepted by the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Begin a fresh story: enter loading and fetch the first installment.
    StartStory,
    /// Load an installment the host fetched itself.
    LoadInstallment(Installment),
    /// Advance to the next chunk (only honored while waiting for input).
    Advance,
    /// Reveal the rest of the current chunk immediately.
    Skip,
    /// Toggle automatic chunk advancement.
    SetAutoAdvance(bool),
    /// Toggle speech narration.
    SetSpeechEnabled(bool),
    /// Move the choice highlight forward.
    NextChoice,
    /// Move the choice highlight backward.
    PreviousChoice,
    /// Move the choice highlight directly (pointer hover).
    HighlightChoice(usize),
    /// Commit the highlighted choice.
    CommitChoice,
    /// The host's own installment fetch failed; end the story.
    GenerationFailed(String),
}

/// The externally observable session state, published through a watch
/// channel after every dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: PlaybackPhase,
    /// The revealed prefix of the current chunk.
    pub displayed_text: String,
    /// The expression the character should show right now, overlay
    /// overrides included.
    pub expression: Expression,
    /// Whether a narration clip is audible.
    pub speaking: bool,
    pub speech_enabled: bool,
    pub auto_advance: bool,
    pub score: i32,
    pub chunk_index: usize,
    pub chunk_count: usize,
    /// The visible choices; empty outside the choice phase.
    pub choices: Vec<Choice>,
    pub highlighted_choice: usize,
    /// The feedback being shown, during the feedback phase.
    pub feedback: Option<Feedback>,
    /// Scene illustration for the current installment.
    pub image_url: Option<String>,
}

/// The interests and guide character a story is generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySetup {
    /// Selected interest themes (typically one).
    pub interests: Vec<String>,
    /// Guide character narrating the story.
    pub character: GuideCharacter,
}

impl StorySetup {
    fn request(&self, decisions: Vec<DecisionRecord>) -> StoryRequest {
        StoryRequest {
            interests: self.interests.clone(),
            character: self.character.clone(),
            decisions,
        }
    }
}

/// Cloneable handle for talking to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<PlayerCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Send a command. Returns `false` when the session has stopped.
    pub async fn send(&self, command: PlayerCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// A fresh receiver over the snapshot stream.
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }
}

/// Completions reported back into the dispatch loop by spawned tasks.
#[derive(Debug)]
enum Wakeup {
    /// A chunk narration resolved.
    NarrationFinished {
        epoch: u64,
        outcome: PlaybackOutcome,
        after_skip: bool,
    },
    /// A scheduled automatic advance came due.
    AdvanceDue { epoch: u64 },
    /// The feedback dwell elapsed.
    FeedbackDone { epoch: u64 },
    /// The next installment arrived (and the minimum loading dwell
    /// elapsed).
    InstallmentFetched {
        epoch: u64,
        installment: Box<Installment>,
    },
    /// The installment fetch failed or produced malformed data.
    FetchFailed { epoch: u64, message: String },
}

/// The narrated playback coordinator for one story view.
pub struct PlaybackSession {
    config: SessionConfig,
    setup: StorySetup,
    narration: Arc<NarrationController>,
    provider: Arc<dyn StoryProvider>,
    reporter: Arc<dyn ProgressReporter>,
    event_bus: Option<EventBus>,

    sequencer: ChunkSequencer,
    typewriter: TypewriterEngine,
    overlay: OverlayCoordinator,
    choices: ChoicePresenter,
    progress: SessionProgress,
    installment: Option<Installment>,

    phase: PlaybackPhase,
    auto_advance: bool,
    speech_enabled: bool,
    /// Whether the choice narration line was already spoken for the
    /// current installment.
    choice_line_spoken: bool,
    /// Bumped on every invalidating transition; see the module docs.
    epoch: u64,

    commands_tx: mpsc::Sender<PlayerCommand>,
    commands_rx: Option<mpsc::Receiver<PlayerCommand>>,
    wakeups_tx: mpsc::UnboundedSender<Wakeup>,
    wakeups_rx: Option<mpsc::UnboundedReceiver<Wakeup>>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl PlaybackSession {
    /// Create a session for one story view.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration fails validation.
    pub fn new(
        config: SessionConfig,
        setup: StorySetup,
        narration: Arc<NarrationController>,
        provider: Arc<dyn StoryProvider>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<Self> {
        config.validate()?;
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (wakeups_tx, wakeups_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let session = Self {
            config,
            setup,
            narration,
            provider,
            reporter,
            event_bus: None,
            sequencer: ChunkSequencer::new(),
            typewriter: TypewriterEngine::new(),
            overlay: OverlayCoordinator::new(),
            choices: ChoicePresenter::new(),
            progress: SessionProgress::new(),
            installment: None,
            phase: PlaybackPhase::Idle,
            auto_advance: false,
            speech_enabled: true,
            choice_line_spoken: false,
            epoch: 0,
            commands_tx,
            commands_rx: Some(commands_rx),
            wakeups_tx,
            wakeups_rx: Some(wakeups_rx),
            snapshot_tx,
            snapshot_rx,
        };
        let initial = session.snapshot();
        session.snapshot_tx.send_replace(initial);
        Ok(session)
    }

    /// Attach an event bus for session and story events.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// A handle for commands and snapshots; obtain before [`run`](Self::run).
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            commands: self.commands_tx.clone(),
            snapshots: self.snapshot_rx.clone(),
        }
    }

    /// Run the dispatch loop until cancelled or every handle is dropped.
    /// Tears down all narration state on exit.
    #[instrument(skip_all)]
    pub async fn run(mut self, cancel: CancellationToken) {
        let Some(mut commands) = self.commands_rx.take() else {
            return;
        };
        let Some(mut wakeups) = self.wakeups_rx.take() else {
            return;
        };
        let mut ticker = tokio::time::interval(self.config.type_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!("playback session started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(wakeup) = wakeups.recv() => self.handle_wakeup(wakeup),
                _ = ticker.tick() => self.handle_tick(),
            }
            self.publish();
        }

        self.narration.reset();
        info!("playback session stopped");
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::StartStory => self.start_story(),
            PlayerCommand::LoadInstallment(installment) => self.load_installment(installment),
            PlayerCommand::Advance => {
                if self.phase == PlaybackPhase::WaitingForInput {
                    self.do_advance();
                }
            }
            PlayerCommand::Skip => self.do_skip(),
            PlayerCommand::SetAutoAdvance(enabled) => {
                self.auto_advance = enabled;
                // Turning auto-advance on while paused moves the story
                // forward without further input.
                if enabled && self.phase == PlaybackPhase::WaitingForInput {
                    self.do_advance();
                }
            }
            PlayerCommand::SetSpeechEnabled(enabled) => {
                self.speech_enabled = enabled;
                if !enabled {
                    self.narration.stop_all();
                }
            }
            PlayerCommand::NextChoice => {
                if self.phase == PlaybackPhase::ChoicesVisible {
                    self.choices.next();
                }
            }
            PlayerCommand::PreviousChoice => {
                if self.phase == PlaybackPhase::ChoicesVisible {
                    self.choices.previous();
                }
            }
            PlayerCommand::HighlightChoice(index) => {
                if self.phase == PlaybackPhase::ChoicesVisible {
                    self.choices.highlight(index);
                }
            }
            PlayerCommand::CommitChoice => self.commit_choice(),
            PlayerCommand::GenerationFailed(message) => self.generation_failed(message),
        }
    }

    fn handle_wakeup(&mut self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::NarrationFinished {
                epoch,
                outcome,
                after_skip,
            } => {
                if epoch != self.epoch {
                    return;
                }
                if self.phase == PlaybackPhase::AutoAdvancing {
                    let delay = if after_skip {
                        self.config.post_skip_delay
                    } else if outcome.finished_naturally() {
                        self.config.post_narration_delay
                    } else {
                        self.config.narration_failure_delay
                    };
                    self.schedule(delay, Wakeup::AdvanceDue { epoch });
                }
            }
            Wakeup::AdvanceDue { epoch } => {
                if epoch != self.epoch || self.phase != PlaybackPhase::AutoAdvancing {
                    return;
                }
                if self.auto_advance {
                    self.do_advance();
                } else {
                    // Auto-advance was switched off while the delay ran.
                    self.sequencer.set_waiting(true);
                    self.set_phase(PlaybackPhase::WaitingForInput);
                }
            }
            Wakeup::FeedbackDone { epoch } => {
                if epoch != self.epoch || self.phase != PlaybackPhase::Feedback {
                    return;
                }
                if self.progress.decision_count() >= self.config.story_length {
                    self.end_story();
                } else {
                    self.begin_loading();
                }
            }
            Wakeup::InstallmentFetched { epoch, installment } => {
                if epoch != self.epoch {
                    return;
                }
                self.load_installment(*installment);
            }
            Wakeup::FetchFailed { epoch, message } => {
                if epoch != self.epoch {
                    return;
                }
                self.generation_failed(message);
            }
        }
    }

    fn handle_tick(&mut self) {
        if self.phase != PlaybackPhase::Typing {
            return;
        }
        if self.typewriter.tick() == Tick::Finished {
            self.emit_session(SessionEvent::ChunkRevealed {
                index: self.sequencer.index(),
                skipped: false,
            });
            self.after_reveal(false);
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn start_story(&mut self) {
        if self.phase == PlaybackPhase::Ended {
            self.progress.reset();
        }
        self.begin_loading();
    }

    fn do_skip(&mut self) {
        if self.phase != PlaybackPhase::Typing || !self.typewriter.skip() {
            return;
        }
        self.narration.stop_all();
        self.emit_session(SessionEvent::ChunkRevealed {
            index: self.sequencer.index(),
            skipped: true,
        });
        self.after_reveal(true);
    }

    /// The current chunk just became fully visible, naturally or by skip.
    fn after_reveal(&mut self, skipped: bool) {
        let Some(chunk) = self.sequencer.current().cloned() else {
            return;
        };
        if self.auto_advance {
            self.set_phase(PlaybackPhase::AutoAdvancing);
            if self.speech_enabled {
                self.spawn_chunk_narration(chunk.text, skipped);
            } else {
                let delay = if skipped {
                    self.config.post_skip_delay
                } else {
                    self.config.muted_advance_delay
                };
                self.schedule(delay, Wakeup::AdvanceDue { epoch: self.epoch });
            }
        } else {
            self.sequencer.set_waiting(true);
            self.set_phase(PlaybackPhase::WaitingForInput);
            if self.speech_enabled {
                self.spawn_chunk_narration(chunk.text, skipped);
            }
        }
    }

    fn do_advance(&mut self) {
        // The previous chunk's narration must not overlap the next one.
        self.narration.stop_all();
        match self.sequencer.advance() {
            Advance::Started(index) => self.start_chunk(index),
            Advance::ChoicesShown => self.show_choices(),
            Advance::Blocked => {}
        }
    }

    /// Begin typing the chunk the sequencer currently points at.
    fn start_chunk(&mut self, index: usize) {
        self.epoch += 1;
        let Some(chunk) = self.sequencer.current().cloned() else {
            return;
        };
        self.typewriter.start(chunk.text.clone());
        self.sequencer.set_waiting(false);
        self.set_phase(PlaybackPhase::Typing);
        self.emit_session(SessionEvent::ChunkStarted {
            index,
            total: self.sequencer.len(),
        });

        if self.speech_enabled {
            self.narration.prefetch(&chunk.text, chunk.expression);
            // One step ahead: the next chunk, or past the last chunk the
            // choice narration line.
            match self.sequencer.peek_next() {
                Some(next) => self.narration.prefetch(&next.text, next.expression),
                None => {
                    if let Some(installment) = &self.installment {
                        self.narration
                            .prefetch(&installment.choice_narration(), Expression::Neutral);
                    }
                }
            }
        }
    }

    fn show_choices(&mut self) {
        self.epoch += 1;
        let (choice_list, narration_line) = match &self.installment {
            Some(installment) => (
                installment.choices().to_vec(),
                installment.choice_narration(),
            ),
            None => return,
        };
        self.choices.present(choice_list);
        self.set_phase(PlaybackPhase::ChoicesVisible);
        self.emit_session(SessionEvent::ChoicesShown {
            count: self.choices.choices().len(),
        });

        if self.speech_enabled && !self.choice_line_spoken {
            self.choice_line_spoken = true;
            let narration = Arc::clone(&self.narration);
            tokio::spawn(async move {
                narration.play(&narration_line).await;
            });
        }
    }

    fn commit_choice(&mut self) {
        if self.phase != PlaybackPhase::ChoicesVisible {
            return;
        }
        let Some(choice) = self.choices.commit() else {
            return;
        };
        // Choice narration stops the moment the selection lands.
        self.narration.stop_all();

        let story = self
            .installment
            .as_ref()
            .map(|installment| installment.chunks().to_vec())
            .unwrap_or_default();
        let score = self.progress.record(story, choice.clone());
        self.emit_session(SessionEvent::ChoiceCommitted {
            text: choice.text.clone(),
            safe: choice.safe,
            points: choice.points,
        });
        self.emit_session(SessionEvent::ScoreChanged { score });

        let feedback = self.progress.feedback_for(&choice);
        self.enter_feedback(feedback);

        if self.progress.decision_count() == self.config.story_length {
            self.report_stats();
        }
    }

    fn enter_feedback(&mut self, feedback: Feedback) {
        self.epoch += 1;
        self.typewriter.cancel();
        self.sequencer.clear();
        self.choices.clear();
        self.narration.set_suppressed(true);
        self.narration.stop_all();
        self.narration.abort_pending();
        self.overlay.enter_feedback(feedback.clone());
        self.set_phase(PlaybackPhase::Feedback);
        self.emit_session(SessionEvent::FeedbackStarted {
            safe: feedback.safe,
        });

        if self.speech_enabled && self.overlay.claim_narration(&feedback.text) {
            let narration = Arc::clone(&self.narration);
            let expression = if feedback.safe {
                Expression::Proud
            } else {
                Expression::Concerned
            };
            tokio::spawn(async move {
                narration.narrate_forced(&feedback.text, expression).await;
            });
        }
        self.schedule(
            self.config.feedback_dwell,
            Wakeup::FeedbackDone { epoch: self.epoch },
        );
    }

    fn begin_loading(&mut self) {
        self.epoch += 1;
        self.typewriter.cancel();
        self.narration.set_suppressed(true);
        self.narration.stop_all();
        self.narration.abort_pending();
        self.overlay.enter_loading();
        self.set_phase(PlaybackPhase::Loading);
        self.emit_session(SessionEvent::LoadingStarted);

        let decisions = self.progress.trailing_window(self.config.decision_window);
        self.emit_story(StoryEvent::InstallmentRequested {
            decision_window: decisions.len(),
        });
        let request = self.setup.request(decisions);
        let provider = Arc::clone(&self.provider);
        let wakeups = self.wakeups_tx.clone();
        let epoch = self.epoch;
        let dwell = self.config.loading_dwell;
        tokio::spawn(async move {
            // The spinner stays up at least the minimum dwell even when
            // generation is fast.
            let (result, _) =
                tokio::join!(provider.next_installment(request), tokio::time::sleep(dwell));
            let wakeup = match result.map(Installment::from_response) {
                Ok(Ok(installment)) => Wakeup::InstallmentFetched {
                    epoch,
                    installment: Box::new(installment),
                },
                Ok(Err(error)) => Wakeup::FetchFailed {
                    epoch,
                    message: error.to_string(),
                },
                Err(error) => Wakeup::FetchFailed {
                    epoch,
                    message: error.to_string(),
                },
            };
            wakeups.send(wakeup).ok();
        });
    }

    fn load_installment(&mut self, installment: Installment) {
        // Tear down everything belonging to the previous installment
        // before the first new fetch goes out.
        self.narration.reset();
        self.narration.set_suppressed(false);
        self.overlay.clear();
        self.choices.clear();
        self.choice_line_spoken = false;
        self.emit_story(StoryEvent::InstallmentArrived {
            chunk_count: installment.chunks().len(),
            has_image: installment.image_url().is_some(),
        });
        self.sequencer.load(installment.chunks().to_vec());
        self.installment = Some(installment);
        self.start_chunk(0);
    }

    fn generation_failed(&mut self, message: String) {
        warn!(%message, "story generation failed; ending story");
        self.emit_story(StoryEvent::GenerationFailed { message });
        self.end_story();
    }

    fn end_story(&mut self) {
        self.epoch += 1;
        self.typewriter.cancel();
        self.overlay.clear();
        self.choices.clear();
        self.narration.set_suppressed(false);
        self.narration.stop_all();
        self.narration.abort_pending();
        self.set_phase(PlaybackPhase::Ended);
        self.emit_session(SessionEvent::StoryEnded {
            final_score: self.progress.score(),
        });
    }

    fn report_stats(&self) {
        let reporter = Arc::clone(&self.reporter);
        let stats = self.progress.stats(true);
        let event_bus = self.event_bus.clone();
        tokio::spawn(async move {
            match reporter.report(stats).await {
                Ok(player) => {
                    info!(
                        stories_completed = player.stories_completed,
                        "session stats reported"
                    );
                    if let Some(bus) = &event_bus {
                        bus.emit(CoreEvent::Story(StoryEvent::StatsReported {
                            safe_choices: stats.safe_choices,
                            total_choices: stats.total_choices,
                        }))
                        .ok();
                    }
                }
                // Reporting is best-effort; the story is unaffected.
                Err(error) => warn!(%error, "failed to report session stats"),
            }
        });
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn spawn_chunk_narration(&self, text: String, after_skip: bool) {
        let narration = Arc::clone(&self.narration);
        let wakeups = self.wakeups_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let outcome = narration.play(&text).await;
            wakeups
                .send(Wakeup::NarrationFinished {
                    epoch,
                    outcome,
                    after_skip,
                })
                .ok();
        });
    }

    fn schedule(&self, delay: Duration, wakeup: Wakeup) {
        let wakeups = self.wakeups_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            wakeups.send(wakeup).ok();
        });
    }

    fn set_phase(&mut self, phase: PlaybackPhase) {
        if self.phase == phase {
            return;
        }
        let from = self.phase;
        self.phase = phase;
        debug!(from = from.name(), to = phase.name(), "phase changed");
        self.emit_session(SessionEvent::PhaseChanged {
            from: from.name().to_string(),
            to: phase.name().to_string(),
        });
    }

    fn snapshot(&self) -> SessionSnapshot {
        let expression = self.overlay.expression_override().unwrap_or_else(|| {
            if self.phase == PlaybackPhase::ChoicesVisible {
                Expression::Neutral
            } else {
                self.sequencer
                    .current()
                    .map(|chunk| chunk.expression)
                    .unwrap_or_default()
            }
        });
        SessionSnapshot {
            phase: self.phase,
            displayed_text: self.typewriter.visible().to_string(),
            expression,
            speaking: self.narration.is_speaking(),
            speech_enabled: self.speech_enabled,
            auto_advance: self.auto_advance,
            score: self.progress.score(),
            chunk_index: self.sequencer.index(),
            chunk_count: self.sequencer.len(),
            choices: if self.choices.is_visible() {
                self.choices.choices().to_vec()
            } else {
                Vec::new()
            },
            highlighted_choice: self.choices.highlighted(),
            feedback: self.overlay.feedback().cloned(),
            image_url: self
                .installment
                .as_ref()
                .and_then(|installment| installment.image_url().map(str::to_string)),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current != snapshot {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }

    fn emit_session(&self, event: SessionEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Session(event)).ok();
        }
    }

    fn emit_story(&self, event: StoryEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Story(event)).ok();
        }
    }
}

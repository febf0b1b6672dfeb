//! Playback session demonstration
//!
//! Runs a scripted two-installment safety story against in-memory stand-ins
//! for the speech, audio, story, and progress services, with auto-advance
//! on and the first choice committed automatically.
//!
//! Run with:
//! ```bash
//! cargo run -p core-session --example session_demo
//! ```

use anyhow::Result;
use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::speech::{SpeechRequest, SpeechSynthesizer};
use bridge_traits::stats::{PlayerStats, ProgressReporter, SessionStats};
use bridge_traits::story::{
    Choice, Expression, GuideCharacter, StoryProvider, StoryRequest, StoryResponse,
};
use bridge_traits::AudioOutput;
use bytes::Bytes;
use core_narration::NarrationController;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_session::expression::chunk_story_text;
use core_session::{
    PlaybackPhase, PlaybackSession, PlayerCommand, SessionConfig, StorySetup,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct DemoSynth;

#[async_trait]
impl SpeechSynthesizer for DemoSynth {
    async fn synthesize(&self, request: SpeechRequest) -> BridgeResult<Bytes> {
        // Pretend synthesis takes a moment and yields a tiny clip.
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(Bytes::from(request.text.into_bytes()))
    }
}

struct DemoOutput;

#[async_trait]
impl AudioOutput for DemoOutput {
    async fn play(&self, _clip: Bytes) -> BridgeResult<()> {
        tokio::time::sleep(Duration::from_millis(120)).await;
        Ok(())
    }
}

struct DemoProvider {
    responses: Mutex<VecDeque<StoryResponse>>,
}

#[async_trait]
impl StoryProvider for DemoProvider {
    async fn next_installment(&self, request: StoryRequest) -> BridgeResult<StoryResponse> {
        println!(
            "  (generator called with {} prior decision(s))",
            request.decisions.len()
        );
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BridgeError::OperationFailed("the story is over".into()))
    }
}

struct DemoReporter;

#[async_trait]
impl ProgressReporter for DemoReporter {
    async fn report(&self, stats: SessionStats) -> BridgeResult<PlayerStats> {
        println!(
            "  (stats reported: {}/{} safe choices)",
            stats.safe_choices, stats.total_choices
        );
        Ok(PlayerStats::default())
    }
}

fn demo_choices() -> Vec<Choice> {
    vec![
        Choice {
            text: "Ask a trusted adult first".into(),
            safe: true,
            points: 10,
        },
        Choice {
            text: "Wait quietly and watch".into(),
            safe: false,
            points: 0,
        },
        Choice {
            text: "Follow the stranger".into(),
            safe: false,
            points: -5,
        },
    ]
}

fn script() -> VecDeque<StoryResponse> {
    [
        "Luna skipped toward the park gates with a happy smile. \
         Suddenly, a stranger called her over to see a puppy! \
         Watch out, Luna, that could be risky.",
        "Luna remembered the lesson about strangers. \
         She found her mom near the fountain and felt safe together. \
         Great job thinking it through!",
    ]
    .into_iter()
    .map(|text| StoryResponse {
        story: chunk_story_text(text, Expression::Neutral),
        choices: demo_choices(),
        image_url: None,
    })
    .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))?;

    let narration = Arc::new(NarrationController::new(
        Arc::new(DemoSynth),
        Arc::new(DemoOutput),
        "Luna the Explorer",
    ));
    let session = PlaybackSession::new(
        SessionConfig::brisk(),
        StorySetup {
            interests: vec!["park safety".into()],
            character: GuideCharacter {
                name: "Luna the Explorer".into(),
                trait_name: "Courage".into(),
            },
        },
        narration,
        Arc::new(DemoProvider {
            responses: Mutex::new(script()),
        }),
        Arc::new(DemoReporter),
    )?;

    let handle = session.handle();
    let cancel = CancellationToken::new();
    let runner = tokio::spawn(session.run(cancel.clone()));

    handle.send(PlayerCommand::SetAutoAdvance(true)).await;
    handle.send(PlayerCommand::StartStory).await;

    let mut snapshots = handle.snapshots();
    let mut last_phase = PlaybackPhase::Idle;
    loop {
        snapshots.changed().await?;
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot.phase == last_phase {
            continue;
        }
        last_phase = snapshot.phase;

        match snapshot.phase {
            PlaybackPhase::AutoAdvancing => {
                println!("[{}] {}", snapshot.expression, snapshot.displayed_text);
            }
            PlaybackPhase::ChoicesVisible => {
                println!("--- choices ---");
                for (index, choice) in snapshot.choices.iter().enumerate() {
                    println!("  {}. {}", index + 1, choice.text);
                }
                // The demo always takes the first (safe) option.
                handle.send(PlayerCommand::CommitChoice).await;
            }
            PlaybackPhase::Feedback => {
                if let Some(feedback) = &snapshot.feedback {
                    println!("*** {} ***", feedback.text);
                }
            }
            PlaybackPhase::Loading => {
                println!("... generating the next part ...");
            }
            PlaybackPhase::Ended => {
                println!("The adventure is over. Final score: {}", snapshot.score);
                break;
            }
            _ => {}
        }
    }

    cancel.cancel();
    runner.await?;
    Ok(())
}

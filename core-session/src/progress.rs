//! # Session Progress
//!
//! The running score, the decision history, and the feedback wording.
//! The score changes only through [`SessionProgress::record`]; everything
//! else reads it through the snapshot.

use crate::model::Feedback;
use bridge_traits::stats::SessionStats;
use bridge_traits::story::{Choice, DecisionRecord, StoryChunk};

/// Feedback line for a safe choice.
pub const SAFE_FEEDBACK: &str = "Great job! That was a safe choice!";

/// Feedback line for any other choice.
pub const UNSAFE_FEEDBACK: &str = "Let's think about that choice...";

/// Score and decision history for one story.
#[derive(Debug, Default)]
pub struct SessionProgress {
    score: i32,
    decisions: Vec<DecisionRecord>,
}

impl SessionProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed choice against the installment it belonged to.
    /// Returns the new score.
    pub fn record(&mut self, story: Vec<StoryChunk>, decision: Choice) -> i32 {
        self.score += decision.points;
        self.decisions.push(DecisionRecord { story, decision });
        self.score
    }

    /// Drop all history and reset the score. Used when a fresh story
    /// starts after a finished one.
    pub fn reset(&mut self) {
        self.score = 0;
        self.decisions.clear();
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }

    /// Number of safe choices made so far.
    pub fn safe_choices(&self) -> u32 {
        self.decisions
            .iter()
            .filter(|record| record.decision.safe)
            .count() as u32
    }

    /// The last `window` decisions, oldest first. The continuation request
    /// carries this instead of the whole transcript.
    pub fn trailing_window(&self, window: usize) -> Vec<DecisionRecord> {
        let start = self.decisions.len().saturating_sub(window);
        self.decisions[start..].to_vec()
    }

    /// The feedback shown and narrated for a committed choice.
    pub fn feedback_for(&self, choice: &Choice) -> Feedback {
        Feedback {
            safe: choice.safe,
            text: if choice.safe {
                SAFE_FEEDBACK.to_string()
            } else {
                UNSAFE_FEEDBACK.to_string()
            },
        }
    }

    /// The stats reported to the progress service when the story finishes.
    pub fn stats(&self, is_complete: bool) -> SessionStats {
        SessionStats {
            safe_choices: self.safe_choices(),
            total_choices: self.decision_count() as u32,
            is_complete,
        }
    }
}

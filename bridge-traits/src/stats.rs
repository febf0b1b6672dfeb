//! Progress reporting and achievement contract.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Achievements the progress service can award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Achievement {
    /// First story ever completed.
    FirstStory,
    /// Five consecutive all-safe stories.
    SafetyStreak,
    /// Any story finished with every choice safe.
    PerfectScore,
    /// Five stories completed overall.
    StoryMaster,
}

/// Outcome of one finished story, reported once per story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Number of safe choices made during the story.
    #[serde(rename = "safeChoices")]
    pub safe_choices: u32,
    /// Total choices made during the story.
    #[serde(rename = "totalChoices")]
    pub total_choices: u32,
    /// Whether the story ran to its configured length.
    #[serde(rename = "isComplete")]
    pub is_complete: bool,
}

impl SessionStats {
    /// Returns `true` when every choice in the story was safe.
    pub fn is_perfect(&self) -> bool {
        self.total_choices > 0 && self.safe_choices == self.total_choices
    }
}

/// Cumulative player stats as maintained by the progress service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(rename = "storiesCompleted")]
    pub stories_completed: u32,
    #[serde(rename = "perfectStories")]
    pub perfect_stories: u32,
    #[serde(rename = "safeChoicesStreak")]
    pub safe_choices_streak: u32,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

/// Contract with the progress/achievement service.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Report a finished story and receive the updated cumulative stats.
    ///
    /// # Errors
    ///
    /// Returns an error when the service is unreachable. Reporting is
    /// best-effort; the playback core logs and continues on failure.
    async fn report(&self, stats: SessionStats) -> Result<PlayerStats>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_session_requires_all_safe() {
        let perfect = SessionStats {
            safe_choices: 5,
            total_choices: 5,
            is_complete: true,
        };
        assert!(perfect.is_perfect());

        let mixed = SessionStats {
            safe_choices: 4,
            total_choices: 5,
            is_complete: true,
        };
        assert!(!mixed.is_perfect());

        let empty = SessionStats {
            safe_choices: 0,
            total_choices: 0,
            is_complete: false,
        };
        assert!(!empty.is_perfect());
    }

    #[test]
    fn achievements_use_screaming_snake_wire_names() {
        let json = serde_json::to_string(&Achievement::SafetyStreak).unwrap();
        assert_eq!(json, "\"SAFETY_STREAK\"");
        let back: Achievement = serde_json::from_str("\"FIRST_STORY\"").unwrap();
        assert_eq!(back, Achievement::FirstStory);
    }
}

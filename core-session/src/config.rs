//! # Session Configuration
//!
//! Timing and pacing knobs for the playback session.

use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback session configuration.
///
/// Controls the typewriter cadence, the post-narration pacing, the overlay
/// dwell times, and the story shape (length, continuation window).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between typewriter ticks; one character is revealed per
    /// tick.
    ///
    /// Default: 30 ms.
    #[serde(default = "default_type_interval")]
    pub type_interval: Duration,

    /// Delay between a chunk's narration completing naturally and the
    /// automatic advance to the next chunk.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_post_narration_delay")]
    pub post_narration_delay: Duration,

    /// Delay used instead of [`post_narration_delay`](Self::post_narration_delay)
    /// when narration failed or never became playable, so the reader gets a
    /// moment with the silent text.
    ///
    /// Default: 800 ms.
    #[serde(default = "default_narration_failure_delay")]
    pub narration_failure_delay: Duration,

    /// Automatic advance delay while speech is disabled entirely. Longer
    /// than the narrated delays to leave reading time.
    ///
    /// Default: 1500 ms.
    #[serde(default = "default_muted_advance_delay")]
    pub muted_advance_delay: Duration,

    /// Advance delay after a user skip. Shorter than a natural completion;
    /// skipping signals impatience.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_post_skip_delay")]
    pub post_skip_delay: Duration,

    /// How long the feedback overlay stays up after a choice.
    ///
    /// Default: 3 s.
    #[serde(default = "default_feedback_dwell")]
    pub feedback_dwell: Duration,

    /// Minimum time the loading overlay stays up, even when the next
    /// installment arrives faster.
    ///
    /// Default: 1.5 s.
    #[serde(default = "default_loading_dwell")]
    pub loading_dwell: Duration,

    /// Number of decisions after which the story is complete and the
    /// session reports its stats.
    ///
    /// Default: 5.
    #[serde(default = "default_story_length")]
    pub story_length: usize,

    /// How many trailing decisions are carried in a continuation request.
    ///
    /// Default: 3.
    #[serde(default = "default_decision_window")]
    pub decision_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            type_interval: default_type_interval(),
            post_narration_delay: default_post_narration_delay(),
            narration_failure_delay: default_narration_failure_delay(),
            muted_advance_delay: default_muted_advance_delay(),
            post_skip_delay: default_post_skip_delay(),
            feedback_dwell: default_feedback_dwell(),
            loading_dwell: default_loading_dwell(),
            story_length: default_story_length(),
            decision_window: default_decision_window(),
        }
    }
}

impl SessionConfig {
    /// A configuration with millisecond-scale pacing. Useful for demos and
    /// scripted runs where the full dwell times would drag.
    pub fn brisk() -> Self {
        Self {
            type_interval: Duration::from_millis(1),
            post_narration_delay: Duration::from_millis(10),
            narration_failure_delay: Duration::from_millis(15),
            muted_advance_delay: Duration::from_millis(25),
            post_skip_delay: Duration::from_millis(10),
            feedback_dwell: Duration::from_millis(50),
            loading_dwell: Duration::from_millis(25),
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.type_interval.is_zero() {
            return Err(SessionError::Config("type_interval must be > 0".into()));
        }
        if self.story_length == 0 {
            return Err(SessionError::Config("story_length must be > 0".into()));
        }
        if self.decision_window == 0 {
            return Err(SessionError::Config("decision_window must be > 0".into()));
        }
        if self.post_skip_delay > self.muted_advance_delay {
            return Err(SessionError::Config(
                "post_skip_delay must not exceed muted_advance_delay".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_type_interval() -> Duration {
    Duration::from_millis(30)
}

fn default_post_narration_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_narration_failure_delay() -> Duration {
    Duration::from_millis(800)
}

fn default_muted_advance_delay() -> Duration {
    Duration::from_millis(1500)
}

fn default_post_skip_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_feedback_dwell() -> Duration {
    Duration::from_secs(3)
}

fn default_loading_dwell() -> Duration {
    Duration::from_millis(1500)
}

fn default_story_length() -> usize {
    5
}

fn default_decision_window() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.type_interval, Duration::from_millis(30));
        assert_eq!(config.feedback_dwell, Duration::from_secs(3));
        assert_eq!(config.story_length, 5);
    }

    #[test]
    fn test_brisk_config() {
        let config = SessionConfig::brisk();
        assert!(config.validate().is_ok());
        assert!(config.feedback_dwell < SessionConfig::default().feedback_dwell);
        // Story shape is pacing-independent.
        assert_eq!(config.story_length, SessionConfig::default().story_length);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SessionConfig::default();
        assert!(config.validate().is_ok());

        config.type_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.type_interval = Duration::from_millis(30);

        config.story_length = 0;
        assert!(config.validate().is_err());
        config.story_length = 5;

        config.post_skip_delay = Duration::from_secs(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.decision_window, 3);
        assert_eq!(config.muted_advance_delay, Duration::from_millis(1500));
    }
}

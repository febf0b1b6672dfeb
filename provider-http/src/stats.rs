//! Progress reporting HTTP client.
//!
//! Posts the finished story's safe/total choice counts; the service
//! updates the cumulative stats and awards achievements (first story,
//! safety streak, perfect score, story master) server-side.

use crate::{status_error, transport_error, AUTH_HEADER};
use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::stats::{PlayerStats, ProgressReporter, SessionStats};
use tracing::{debug, instrument};

/// Progress and achievement reporting over HTTP.
pub struct StatsClient {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl StatsClient {
    /// Create a client posting to the given endpoint (e.g.
    /// `https://host/api/achievements/update-stats`).
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            auth_token: None,
        }
    }

    /// Attach the session auth token sent with every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[async_trait]
impl ProgressReporter for StatsClient {
    #[instrument(skip(self))]
    async fn report(&self, stats: SessionStats) -> Result<PlayerStats> {
        let mut builder = self.client.post(&self.endpoint).json(&stats);
        if let Some(token) = &self.auth_token {
            builder = builder.header(AUTH_HEADER, token);
        }
        let response = builder.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let player: PlayerStats = response.json().await.map_err(transport_error)?;
        debug!(
            stories_completed = player.stories_completed,
            achievements = player.achievements.len(),
            "player stats updated"
        );
        Ok(player)
    }
}

#[cfg(test)]
mod tests {
    use bridge_traits::stats::{Achievement, PlayerStats};

    #[test]
    fn parses_service_response_shape() {
        let json = r#"{
            "storiesCompleted": 5,
            "perfectStories": 1,
            "safeChoicesStreak": 2,
            "achievements": ["FIRST_STORY", "STORY_MASTER"]
        }"#;
        let player: PlayerStats = serde_json::from_str(json).unwrap();
        assert_eq!(player.stories_completed, 5);
        assert_eq!(
            player.achievements,
            vec![Achievement::FirstStory, Achievement::StoryMaster]
        );
    }
}

//! Story generation HTTP client.
//!
//! Posts the interests, guide character, and trailing decision window;
//! receives one installment of chunks, choices, and an optional scene
//! image URL.
//!
//! ## Image contract
//!
//! Scene image synthesis happens server-side with up to 3 attempts on an
//! exponential backoff starting at 5 s, each attempt capped at 30 s, and a
//! quota-exhausted (402-class) answer short-circuiting the retries. The
//! client never sees any of that: a degraded installment simply arrives
//! with `imageUrl: null`, which is not an error here.

use crate::{status_error, transport_error, AUTH_HEADER};
use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::story::{StoryProvider, StoryRequest, StoryResponse};
use tracing::{debug, instrument};

/// Installment generation over HTTP.
pub struct StoryClient {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl StoryClient {
    /// Create a client posting to the given endpoint (e.g.
    /// `https://host/api/generate-story`).
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
impl StoryProvider for StoryClient {
    #[instrument(skip(self, request), fields(decisions = request.decisions.len()))]
    async fn next_installment(&self, request: StoryRequest) -> Result<StoryResponse> {
        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.auth_token {
            builder = builder.header(AUTH_HEADER, token);
        }
        let response = builder.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let installment: StoryResponse = response.json().await.map_err(transport_error)?;
        debug!(
            chunks = installment.story.len(),
            has_image = installment.image_url.is_some(),
            "installment received"
        );
        Ok(installment)
    }
}

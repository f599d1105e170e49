use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::oauth;
use crate::types::{MAX_MESSAGE_CHARS, PublishError, TwitterCredentials};

/// Default X API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";

/// Trait for feeds that status updates can be delivered to
#[async_trait]
pub trait FeedPublisher: Send + Sync {
    /// Delivers `text` as-is and returns the identifier the feed assigned to it
    async fn publish(&self, text: &str) -> Result<String, PublishError>;
}

/// X (Twitter) API v2 client authenticated with user-context OAuth 1.0a
pub struct TwitterClient {
    client: Client,
    base_url: String,
    credentials: TwitterCredentials,
}

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: Option<CreatedTweet>,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

impl TwitterClient {
    /// Create a new client posting to `base_url` (normally [`DEFAULT_API_BASE_URL`])
    pub fn new(
        credentials: TwitterCredentials,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Client(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        log::info!("Twitter client initialized successfully");

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn tweets_url(&self) -> String {
        format!("{}/2/tweets", self.base_url)
    }
}

#[async_trait]
impl FeedPublisher for TwitterClient {
    async fn publish(&self, text: &str) -> Result<String, PublishError> {
        let url = self.tweets_url();
        let authorization = oauth::authorization_header(
            "POST",
            &url,
            &self.credentials,
            &oauth::generate_nonce(),
            Utc::now().timestamp(),
        )?;

        log::info!("Sending update to Twitter API");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .json(&CreateTweetRequest { text })
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            return Err(match status.as_u16() {
                401 | 403 => PublishError::Unauthorized(body),
                429 => PublishError::RateLimited,
                code => PublishError::Api { status: code, body },
            });
        }

        let created: CreateTweetResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        created
            .data
            .map(|tweet| tweet.id)
            .ok_or(PublishError::MissingData)
    }
}

/// Shortens `text` to [`MAX_MESSAGE_CHARS`] characters, ending it with `...` when cut
pub fn truncate_message(text: &str) -> Cow<'_, str> {
    let length = text.chars().count();
    if length <= MAX_MESSAGE_CHARS {
        return Cow::Borrowed(text);
    }

    log::warn!(
        "Update length ({}) exceeds {} characters, truncating",
        length,
        MAX_MESSAGE_CHARS
    );

    let mut truncated: String = text.chars().take(MAX_MESSAGE_CHARS - 3).collect();
    truncated.push_str("...");
    Cow::Owned(truncated)
}

/// Posts `text` through `publisher`, returning whether it was delivered.
///
/// Blank text is never submitted. Oversized text is truncated first.
/// Failures are logged, never propagated.
pub async fn send_update(publisher: &dyn FeedPublisher, text: &str) -> bool {
    if text.trim().is_empty() {
        log::error!("{}", PublishError::EmptyMessage);
        return false;
    }

    let text = truncate_message(text);

    match publisher.publish(&text).await {
        Ok(id) => {
            log::info!("Update sent successfully! ID: {}", id);
            true
        }
        Err(e) => {
            log::error!("Failed to send update: {}", e);
            false
        }
    }
}

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::time::sleep;

use crate::types::{FetchConfig, FetchError};

/// Timeout for the startup connectivity probe.
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Client for downloading the ATL wait-time page
pub struct SiteClient {
    client: Client,
    config: FetchConfig,
}

impl SiteClient {
    /// Create a new client with the given retry and timeout settings
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Download the HTML of `url`, retrying transient failures with exponential backoff
    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        log::info!("Downloading HTML from {}", url);

        let mut retries = 0;
        loop {
            match self.try_fetch(url).await {
                Ok(body) => {
                    log::info!("Successfully downloaded HTML ({} bytes)", body.len());
                    return Ok(body);
                }
                Err(e)
                    if retries < self.config.max_retries
                        && e.is_retryable(&self.config.retry_statuses) =>
                {
                    retries += 1;
                    let delay = self.config.backoff_delay(retries);
                    log::warn!(
                        "Request to {} failed ({}), retry {}/{} in {:?}",
                        url,
                        e,
                        retries,
                        self.config.max_retries,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    log::error!("Failed to download {}: {}", url, e);
                    return Err(e);
                }
            }
        }
    }

    /// Single GET with status and content-type checks
    async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !content_type.contains("text/html") {
            return Err(FetchError::NotHtml(content_type));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }

    /// Check that `url` answers with a success status, without retries
    pub async fn check_connectivity(&self, url: &str) -> Result<(), FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(CONNECTIVITY_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        log::info!("Network connectivity check passed ({})", url);
        Ok(())
    }

    fn transport_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.config.request_timeout.as_secs())
        } else if error.is_connect() {
            FetchError::Connection(error.to_string())
        } else if error.is_body() || error.is_decode() {
            FetchError::Body(error.to_string())
        } else {
            FetchError::Request(error.to_string())
        }
    }
}

use std::time::Duration;

/// Longest pause between two retries, whatever the backoff factor.
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Settings for downloading the wait-time page
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout applied to every request (default: 10 seconds)
    pub request_timeout: Duration,

    /// Retries allowed after the first attempt (default: 3)
    pub max_retries: u32,

    /// Base of the exponential backoff, in seconds (default: 2)
    pub backoff_factor: f64,

    /// Status codes worth retrying (default: 429, 500, 502, 503, 504)
    pub retry_statuses: Vec<u16>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_factor: 2.0,
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl FetchConfig {
    /// Delay before the given retry (1-based): `backoff_factor * 2^(retry - 1)` seconds
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(30) as i32;
        let seconds = self.backoff_factor.max(0.0) * 2f64.powi(exponent);
        Duration::try_from_secs_f64(seconds.min(MAX_BACKOFF.as_secs_f64())).unwrap_or(MAX_BACKOFF)
    }
}

/// Errors raised while downloading a page
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The server could not be reached.
    #[error("Connection error occurred: {0}")]
    Connection(String),

    /// The request could not be built or sent, e.g. a malformed URL.
    #[error("Error occurred during request: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP error occurred: status {0}")]
    Status(u16),

    /// The response is not an HTML document.
    #[error("Response content type is not HTML: {0}")]
    NotHtml(String),

    /// The response body could not be read in full.
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Whether another attempt may succeed, given the statuses configured as retryable
    pub fn is_retryable(&self, retry_statuses: &[u16]) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Connection(_) | FetchError::Body(_) => true,
            FetchError::Status(status) => retry_statuses.contains(status),
            FetchError::Client(_) | FetchError::Request(_) | FetchError::NotHtml(_) => false,
        }
    }
}

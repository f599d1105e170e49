use std::fmt;

/// Longest update the feed accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 280;

/// Environment variables holding the X API credentials, in the order they are reported.
pub const CREDENTIAL_VARS: [&str; 4] = [
    "TWITTER_API_KEY",
    "TWITTER_API_SECRET",
    "TWITTER_ACCESS_TOKEN",
    "TWITTER_ACCESS_TOKEN_SECRET",
];

/// Errors for publishing updates.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// One or more credential variables are unset or empty.
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    /// The update text was empty after trimming.
    #[error("Cannot send an empty update")]
    EmptyMessage,

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The request could not be signed.
    #[error("Failed to sign request: {0}")]
    Signing(String),

    /// The request never reached the API.
    #[error("Network error: {0}")]
    Network(String),

    /// The API rejected the credentials.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The API asked us to slow down.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The API answered with another error status.
    #[error("API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The response did not carry the created update.
    #[error("Response did not contain expected data")]
    MissingData,
}

/// User-context OAuth 1.0a credentials for the X API
#[derive(Clone)]
pub struct TwitterCredentials {
    /// Consumer (API) key
    pub api_key: String,
    /// Consumer (API) secret
    pub api_secret: String,
    /// Access token of the posting account
    pub access_token: String,
    /// Access token secret of the posting account
    pub access_token_secret: String,
}

impl TwitterCredentials {
    /// Loads the credentials from the process environment
    pub fn from_env() -> Result<Self, PublishError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the credentials through `lookup`, reporting every missing variable at once
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PublishError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values =
            CREDENTIAL_VARS.map(|name| lookup(name).filter(|value| !value.trim().is_empty()));

        match values {
            [
                Some(api_key),
                Some(api_secret),
                Some(access_token),
                Some(access_token_secret),
            ] => Ok(Self {
                api_key,
                api_secret,
                access_token,
                access_token_secret,
            }),
            values => {
                let missing = CREDENTIAL_VARS
                    .iter()
                    .zip(values.iter())
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect();
                Err(PublishError::MissingCredentials(missing))
            }
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

//! # Social Services
//!
//! This crate publishes status updates to the X (Twitter) feed.
//! It includes the OAuth 1.0a request signing, the API client and the
//! caller-side checks applied before anything is posted.

/// OAuth 1.0a signature and header construction.
pub mod oauth;
/// Feed publishing trait, the X API client and update submission.
pub mod service;
/// Credentials, limits and errors used by the publishing services.
pub mod types;

pub use service::{FeedPublisher, TwitterClient, send_update, truncate_message};
pub use types::{MAX_MESSAGE_CHARS, PublishError, TwitterCredentials};

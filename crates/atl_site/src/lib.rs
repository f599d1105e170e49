//! # ATL Site
//!
//! This crate provides the HTTP client used to download the ATL airport wait-time page,
//! with a request timeout, bounded retries and an HTML content-type check.

/// Client for downloading the wait-time page.
mod site_client;
pub use site_client::*;

/// Types and errors for page downloads.
mod types;
pub use types::*;

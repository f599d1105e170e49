//! # Wait Times
//!
//! This crate turns the ATL airport security wait-time page into structured readings
//! and renders those readings as a short status message for the feed.

/// Types describing a wait-time reading and its severity bands.
mod types;
pub use types::*;

/// Extraction of checkpoint wait times from the page markup.
mod extractor;
pub use extractor::*;

/// Status message rendering with severity glyphs.
mod formatter;
pub use formatter::*;

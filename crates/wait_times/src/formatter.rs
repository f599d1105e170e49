use chrono::{Local, NaiveDateTime};

use crate::types::{ATL_WAIT_TIMES_URL, SeverityThresholds, WaitTimeReading};

/// Timestamp layout used in the message header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Word stripped from checkpoint labels before display.
const CHECKPOINT_WORD: &str = "CHECKPOINT";

const PRECHECK_PHRASE: &str = "PRECHECK ONLY";
const PRECHECK_DISPLAY: &str = "(Pre-Check Only)";

/// Message posted when a cycle produced no wait times
pub fn unavailable_message() -> String {
    format!(
        "TSA wait times currently unavailable. Please check {}",
        ATL_WAIT_TIMES_URL
    )
}

/// Renders a reading as a status message stamped with `now`.
///
/// An empty reading renders as [`unavailable_message`]. Otherwise the message is a header
/// line, a blank line, and one `"<glyph> <name>: <minutes> min"` line per checkpoint in
/// reading order.
pub fn format_message(
    reading: &WaitTimeReading,
    now: NaiveDateTime,
    thresholds: &SeverityThresholds,
) -> String {
    if reading.is_empty() {
        log::warn!("No wait times to format");
        return unavailable_message();
    }

    let mut message = format!(
        "Current TSA wait times (as of {}):\n\n",
        now.format(TIMESTAMP_FORMAT)
    );

    for (label, minutes) in reading.iter() {
        let glyph = thresholds.band_for(minutes).glyph();
        message.push_str(&format!(
            "{} {}: {} min\n",
            glyph,
            display_name(label),
            minutes
        ));
    }

    log::debug!("Formatted message: {}", message);
    message
}

/// [`format_message`] stamped with the local wall clock
pub fn format_now(reading: &WaitTimeReading, thresholds: &SeverityThresholds) -> String {
    format_message(reading, Local::now().naive_local(), thresholds)
}

/// Turns a raw checkpoint label such as `"NORTH CHECKPOINT"` into `"North"`
pub fn display_name(label: &str) -> String {
    let stripped = remove_ignore_ascii_case(label, CHECKPOINT_WORD);

    let segments: Vec<String> = stripped.split(PRECHECK_PHRASE).map(title_case).collect();

    segments
        .join(PRECHECK_DISPLAY)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes every occurrence of `word`, ignoring ASCII case
fn remove_ignore_ascii_case(text: &str, word: &str) -> String {
    // ASCII upper-casing keeps byte offsets identical to `text`.
    let haystack = text.to_ascii_uppercase();
    let needle = word.to_ascii_uppercase();

    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in haystack.match_indices(&needle) {
        result.push_str(&text[last..start]);
        last = start + needle.len();
    }
    result.push_str(&text[last..]);
    result
}

/// Upper-cases the first letter of every word and lower-cases the rest.
///
/// A word starts at any letter that follows a non-letter, so `"PRE-CHECK"` becomes `"Pre-Check"`.
fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                result.extend(ch.to_lowercase());
            } else {
                result.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(ch);
            in_word = false;
        }
    }

    result
}

use std::fmt;

use scraper::{ElementRef, Html, Selector};

use crate::types::WaitTimeReading;

/// Class token the ATL page puts on every checkpoint cell.
///
/// The token looks like a typo on the site; it is matched verbatim.
pub const MARKER_CLASS: &str = "lomestic";

/// Text that identifies the domestic terminal heading (compared case-insensitively).
const SECTION_KEYWORD: &str = "domestic";

/// Something noteworthy that happened while extracting a reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractDiagnostic {
    /// A selector could not be compiled.
    InvalidSelector(String),
    /// No heading mentioning the domestic terminal was found.
    HeadingMissing,
    /// One of the label or value sequences was empty.
    NoElements {
        /// Number of checkpoint labels found
        labels: usize,
        /// Number of wait-time values found
        values: usize,
    },
    /// The label and value sequences have different lengths.
    CountMismatch {
        /// Number of checkpoint labels found
        labels: usize,
        /// Number of wait-time values found
        values: usize,
    },
    /// A wait-time value was not a non-negative integer.
    InvalidValue {
        /// Checkpoint label the value belonged to
        label: String,
        /// Offending text
        value: String,
    },
}

impl ExtractDiagnostic {
    /// Level the diagnostic is logged at
    pub fn level(&self) -> log::Level {
        match self {
            ExtractDiagnostic::InvalidSelector(_) => log::Level::Error,
            _ => log::Level::Warn,
        }
    }
}

impl fmt::Display for ExtractDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractDiagnostic::InvalidSelector(reason) => {
                write!(f, "Invalid selector: {}", reason)
            }
            ExtractDiagnostic::HeadingMissing => {
                write!(f, "Failed to find DOMESTIC heading in HTML")
            }
            ExtractDiagnostic::NoElements { labels, values } => write!(
                f,
                "No checkpoint or time elements found (checkpoints: {}, times: {})",
                labels, values
            ),
            ExtractDiagnostic::CountMismatch { labels, values } => write!(
                f,
                "Mismatch between checkpoint count ({}) and time count ({})",
                labels, values
            ),
            ExtractDiagnostic::InvalidValue { label, value } => write!(
                f,
                "Could not convert wait time '{}' to integer for {}",
                value, label
            ),
        }
    }
}

/// Result of an extraction together with everything worth reporting about it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Checkpoints that were successfully read
    pub reading: WaitTimeReading,
    /// Problems met along the way, in the order they occurred
    pub diagnostics: Vec<ExtractDiagnostic>,
}

impl Extraction {
    fn empty_with(diagnostic: ExtractDiagnostic) -> Self {
        Self {
            reading: WaitTimeReading::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

/// Extracts domestic checkpoint wait times from the page markup.
///
/// Never fails: malformed or unexpected markup yields an empty (or partial) reading,
/// and every problem is reported through the `log` facade.
pub fn extract(markup: &str) -> WaitTimeReading {
    let extraction = extract_with_report(markup);

    for diagnostic in &extraction.diagnostics {
        log::log!(diagnostic.level(), "{}", diagnostic);
    }

    if !extraction.reading.is_empty() {
        log::info!(
            "Successfully extracted wait times for {} checkpoints",
            extraction.reading.len()
        );
    }

    extraction.reading
}

/// Same as [`extract`], but returns the diagnostics instead of logging them
pub fn extract_with_report(markup: &str) -> Extraction {
    let (label_selector, value_selector) = match checkpoint_selectors() {
        Ok(selectors) => selectors,
        Err(reason) => return Extraction::empty_with(ExtractDiagnostic::InvalidSelector(reason)),
    };
    let heading_selector = match Selector::parse("h1") {
        Ok(selector) => selector,
        Err(e) => {
            return Extraction::empty_with(ExtractDiagnostic::InvalidSelector(format!("{:?}", e)));
        }
    };

    let document = Html::parse_document(markup);

    let Some(heading) = document.select(&heading_selector).find(|heading| {
        heading
            .text()
            .collect::<String>()
            .trim()
            .to_lowercase()
            .contains(SECTION_KEYWORD)
    }) else {
        return Extraction::empty_with(ExtractDiagnostic::HeadingMissing);
    };

    let section = section_container(heading);

    let labels: Vec<String> = section.select(&label_selector).map(element_text).collect();
    let values: Vec<String> = section.select(&value_selector).map(element_text).collect();

    if labels.is_empty() || values.is_empty() {
        return Extraction::empty_with(ExtractDiagnostic::NoElements {
            labels: labels.len(),
            values: values.len(),
        });
    }

    let mut extraction = Extraction::default();

    if labels.len() != values.len() {
        extraction.diagnostics.push(ExtractDiagnostic::CountMismatch {
            labels: labels.len(),
            values: values.len(),
        });
    }

    for (label, value) in labels.into_iter().zip(values) {
        match value.parse::<u32>() {
            Ok(minutes) => extraction.reading.insert(label, minutes),
            Err(_) => extraction
                .diagnostics
                .push(ExtractDiagnostic::InvalidValue { label, value }),
        }
    }

    extraction
}

/// Selectors for checkpoint names and their wait-time values
fn checkpoint_selectors() -> Result<(Selector, Selector), String> {
    let labels = Selector::parse(&format!(".{} > h2", MARKER_CLASS))
        .map_err(|e| format!("checkpoint selector: {:?}", e))?;
    let values = Selector::parse(&format!(
        ".{}.float-right > .declasser3 > button > span",
        MARKER_CLASS
    ))
    .map_err(|e| format!("wait time selector: {:?}", e))?;

    Ok((labels, values))
}

/// The container two levels above the heading, or the highest element reached before that
fn section_container(heading: ElementRef<'_>) -> ElementRef<'_> {
    let mut container = heading;
    for _ in 0..2 {
        match container.parent().and_then(ElementRef::wrap) {
            Some(parent) => container = parent,
            None => break,
        }
    }
    container
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

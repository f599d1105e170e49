use std::fmt;

/// Public page the wait times are scraped from.
pub const ATL_WAIT_TIMES_URL: &str = "https://www.atl.com/times/";

/// One snapshot of checkpoint wait times, in the order the checkpoints appear on the page.
///
/// Labels are unique. Inserting a label that is already present replaces its minutes
/// but keeps the position where the label was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitTimeReading {
    entries: Vec<(String, u32)>,
}

impl WaitTimeReading {
    /// Creates an empty reading
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the wait time for a checkpoint, overwriting any previous value for the same label
    pub fn insert(&mut self, label: impl Into<String>, minutes: u32) {
        let label = label.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some(entry) => entry.1 = minutes,
            None => self.entries.push((label, minutes)),
        }
    }

    /// Minutes recorded for a checkpoint label
    pub fn get(&self, label: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, minutes)| *minutes)
    }

    /// Whether a checkpoint label is present
    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Number of checkpoints in the reading
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the reading holds no checkpoints
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(label, minutes)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .map(|(label, minutes)| (label.as_str(), *minutes))
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for WaitTimeReading {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut reading = Self::new();
        for (label, minutes) in iter {
            reading.insert(label, minutes);
        }
        reading
    }
}

impl fmt::Display for WaitTimeReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (label, minutes)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", label, minutes)?;
        }
        write!(f, "}}")
    }
}

/// Coarse classification of a wait time, ordered from shortest to longest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeverityBand {
    /// At or below the green threshold
    Green,
    /// At or below the yellow threshold
    Yellow,
    /// At or below the orange threshold
    Orange,
    /// At or below the purple threshold
    Purple,
    /// Above every threshold
    Red,
}

impl SeverityBand {
    /// Glyph shown in front of a checkpoint line
    pub fn glyph(self) -> &'static str {
        match self {
            SeverityBand::Green => "🟢",
            SeverityBand::Yellow => "🟡",
            SeverityBand::Orange => "🟠",
            SeverityBand::Purple => "🟣",
            SeverityBand::Red => "🔴",
        }
    }
}

/// Inclusive upper bounds (in minutes) of the first four severity bands.
///
/// Anything above `purple` is red. The bounds are fixed at startup and shared read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityThresholds {
    green: u32,
    yellow: u32,
    orange: u32,
    purple: u32,
}

/// Errors raised while building severity thresholds
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ThresholdError {
    /// The four bounds are not strictly increasing.
    #[error(
        "Severity thresholds must be strictly ascending (green={green}, yellow={yellow}, orange={orange}, purple={purple})"
    )]
    NotAscending {
        /// Green bound
        green: u32,
        /// Yellow bound
        yellow: u32,
        /// Orange bound
        orange: u32,
        /// Purple bound
        purple: u32,
    },
}

impl SeverityThresholds {
    /// Builds thresholds, rejecting bounds that are not strictly ascending
    pub fn new(green: u32, yellow: u32, orange: u32, purple: u32) -> Result<Self, ThresholdError> {
        if green < yellow && yellow < orange && orange < purple {
            Ok(Self {
                green,
                yellow,
                orange,
                purple,
            })
        } else {
            Err(ThresholdError::NotAscending {
                green,
                yellow,
                orange,
                purple,
            })
        }
    }

    /// Classifies a wait time. A value exactly on a bound belongs to the lower band.
    pub fn band_for(&self, minutes: u32) -> SeverityBand {
        if minutes <= self.green {
            SeverityBand::Green
        } else if minutes <= self.yellow {
            SeverityBand::Yellow
        } else if minutes <= self.orange {
            SeverityBand::Orange
        } else if minutes <= self.purple {
            SeverityBand::Purple
        } else {
            SeverityBand::Red
        }
    }

    /// Bounds as `(green, yellow, orange, purple)`
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (self.green, self.yellow, self.orange, self.purple)
    }
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            green: 15,
            yellow: 30,
            orange: 45,
            purple: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position_and_last_value() {
        let mut reading = WaitTimeReading::new();
        reading.insert("NORTH CHECKPOINT", 10);
        reading.insert("SOUTH CHECKPOINT", 20);
        reading.insert("NORTH CHECKPOINT", 30);

        let entries: Vec<_> = reading.iter().collect();
        assert_eq!(
            entries,
            vec![("NORTH CHECKPOINT", 30), ("SOUTH CHECKPOINT", 20)]
        );
    }

    #[test]
    fn test_reading_display() {
        let reading: WaitTimeReading = [("NORTH", 5), ("SOUTH", 12)].into_iter().collect();
        assert_eq!(reading.to_string(), "{NORTH: 5, SOUTH: 12}");
        assert_eq!(WaitTimeReading::new().to_string(), "{}");
    }

    #[test]
    fn test_default_thresholds() {
        assert_eq!(SeverityThresholds::default().bounds(), (15, 30, 45, 60));
    }

    #[test]
    fn test_band_boundaries() {
        let thresholds = SeverityThresholds::default();

        assert_eq!(thresholds.band_for(0), SeverityBand::Green);
        assert_eq!(thresholds.band_for(15), SeverityBand::Green);
        assert_eq!(thresholds.band_for(16), SeverityBand::Yellow);
        assert_eq!(thresholds.band_for(30), SeverityBand::Yellow);
        assert_eq!(thresholds.band_for(45), SeverityBand::Orange);
        assert_eq!(thresholds.band_for(60), SeverityBand::Purple);
        assert_eq!(thresholds.band_for(61), SeverityBand::Red);
    }

    #[test]
    fn test_thresholds_must_ascend() {
        assert!(SeverityThresholds::new(5, 10, 20, 40).is_ok());
        assert!(matches!(
            SeverityThresholds::new(15, 15, 45, 60),
            Err(ThresholdError::NotAscending { .. })
        ));
        assert!(SeverityThresholds::new(60, 45, 30, 15).is_err());
    }

    #[test]
    fn test_glyphs_are_distinct() {
        let glyphs = [
            SeverityBand::Green.glyph(),
            SeverityBand::Yellow.glyph(),
            SeverityBand::Orange.glyph(),
            SeverityBand::Purple.glyph(),
            SeverityBand::Red.glyph(),
        ];
        for (i, a) in glyphs.iter().enumerate() {
            for b in &glyphs[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}

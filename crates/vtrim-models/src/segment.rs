//! Transcript segments and keep-ranges.

use serde::{Deserialize, Serialize};

/// A transcribed span of speech with start/end timestamps in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// A `(start, end)` interval of source media to retain in the output,
/// in seconds.
///
/// Serialized as a two-element array `[start, end]`, matching the wire
/// format the analysis model returns in its `keep_ranges` list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct KeepRange {
    pub start: f64,
    pub end: f64,
}

impl KeepRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// A range that does not advance time carries no content.
    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }
}

impl From<(f64, f64)> for KeepRange {
    fn from((start, end): (f64, f64)) -> Self {
        Self { start, end }
    }
}

impl From<KeepRange> for (f64, f64) {
    fn from(r: KeepRange) -> Self {
        (r.start, r.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_range_wire_format() {
        let json = serde_json::to_string(&KeepRange::new(2.0, 9.5)).unwrap();
        assert_eq!(json, "[2.0,9.5]");

        let ranges: Vec<KeepRange> = serde_json::from_str("[[0,5.2],[8.4,15.0]]").unwrap();
        assert_eq!(ranges, vec![KeepRange::new(0.0, 5.2), KeepRange::new(8.4, 15.0)]);
    }

    #[test]
    fn test_degenerate_detection() {
        assert!(KeepRange::new(5.0, 3.0).is_degenerate());
        assert!(KeepRange::new(3.0, 3.0).is_degenerate());
        assert!(!KeepRange::new(3.0, 3.1).is_degenerate());
        assert_eq!(KeepRange::new(5.0, 3.0).duration(), 0.0);
    }
}

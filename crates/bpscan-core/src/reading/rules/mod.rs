//! Rule-based reading strategies.
//!
//! Each strategy is a plain function over the raw text returning an
//! optional [`Candidate`]. [`Strategy::ORDER`] fixes the priority: the
//! extractor takes the first strategy that produces a match and never
//! merges partial matches across strategies.

pub mod patterns;
pub mod pulse;
pub mod sequence;
pub mod pairs;

pub use pairs::{labeled, slash_pair};
pub use pulse::pulse_label;
pub use sequence::{bare_numbers, candidate_numbers, sanitize, triple};

use serde::{Deserialize, Serialize};

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Raw numbers located by a strategy, before pulse resolution and bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub sys: u16,
    pub dia: u16,
    /// Positional pulse guess (third number), if the strategy has one.
    pub pulse: Option<u16>,
}

/// The pattern strategies, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Two numbers joined by `/` or `-`.
    SlashPair,
    /// `SYS` ... `DIA` labels.
    Labeled,
    /// Three numbers in a row.
    Triple,
    /// Any candidate numbers, in order of appearance.
    BareNumbers,
}

impl Strategy {
    /// Evaluation order.
    pub const ORDER: [Strategy; 4] = [
        Strategy::SlashPair,
        Strategy::Labeled,
        Strategy::Triple,
        Strategy::BareNumbers,
    ];

    /// Run this strategy against `text`.
    pub fn apply(self, text: &str) -> Option<ExtractionMatch<Candidate>> {
        match self {
            Strategy::SlashPair => slash_pair(text),
            Strategy::Labeled => labeled(text),
            Strategy::Triple => triple(text),
            Strategy::BareNumbers => bare_numbers(text),
        }
    }

    /// Whether an explicit pulse label may override this strategy's result.
    pub fn resolves_pulse_label(self) -> bool {
        !matches!(self, Strategy::BareNumbers)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::SlashPair => "slash_pair",
            Strategy::Labeled => "labeled",
            Strategy::Triple => "triple",
            Strategy::BareNumbers => "bare_numbers",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a digit run if it is a candidate number: 2-3 digits, no leading zero.
pub fn is_candidate(digits: &str) -> Option<u16> {
    let len = digits.len();
    if !(2..=3).contains(&len) || digits.starts_with('0') {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_candidate() {
        assert_eq!(is_candidate("80"), Some(80));
        assert_eq!(is_candidate("120"), Some(120));
        assert_eq!(is_candidate("7"), None);
        assert_eq!(is_candidate("080"), None);
        assert_eq!(is_candidate("1200"), None);
        assert_eq!(is_candidate(""), None);
    }

    #[test]
    fn test_order_is_fixed() {
        assert_eq!(
            Strategy::ORDER,
            [
                Strategy::SlashPair,
                Strategy::Labeled,
                Strategy::Triple,
                Strategy::BareNumbers
            ]
        );
        assert!(Strategy::Triple.resolves_pulse_label());
        assert!(!Strategy::BareNumbers.resolves_pulse_label());
    }
}

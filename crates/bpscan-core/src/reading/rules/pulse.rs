//! Explicit pulse label lookup.

use super::patterns::PULSE_LABEL;
use super::{is_candidate, ExtractionMatch};

/// Find a number introduced by `PULSE`, `PR` or `HR` anywhere in the text.
pub fn pulse_label(text: &str) -> Option<ExtractionMatch<u16>> {
    PULSE_LABEL.captures_iter(text).find_map(|caps| {
        let digits = caps.get(1)?;
        let pulse = is_candidate(digits.as_str())?;
        let full_match = caps.get(0)?;

        Some(
            ExtractionMatch::new(pulse, 0.95, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    })
}

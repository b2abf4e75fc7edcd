//! Common regex patterns for blood-pressure display text.
//!
//! A candidate number is a 2-3 digit run without a leading zero. Rust's
//! regex engine has no lookaround, so number boundaries are expressed as
//! `(?:^|[^0-9])` / `(?:[^0-9]|$)` and labeled captures take the whole
//! digit run, leaving the length check to [`super::is_candidate`].

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Any run of ASCII digits
    pub static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").unwrap();

    // 120/80, 120 - 80
    pub static ref SLASH_PAIR: Regex = Regex::new(
        r"(?:^|[^0-9])([1-9][0-9]{1,2})\s*[/\-]\s*([1-9][0-9]{1,2})(?:[^0-9]|$)"
    ).unwrap();

    // SYS 125 ... DIA 82 (labels may be embedded, e.g. "Systolic")
    pub static ref LABELED_SYS_DIA: Regex = Regex::new(
        r"(?is)SYS[^0-9]*([0-9]+).*?DIA[^0-9]*([0-9]+)"
    ).unwrap();

    // 120 80 72
    pub static ref TRIPLE: Regex = Regex::new(
        r"(?:^|[^0-9])([1-9][0-9]{1,2})[^0-9]+([1-9][0-9]{1,2})[^0-9]+([1-9][0-9]{1,2})(?:[^0-9]|$)"
    ).unwrap();

    // PULSE 72, PR: 72, HR 72, Pulse/min 88 (only a colon may sit between
    // label and number; PR/HR must start a word)
    pub static ref PULSE_LABEL: Regex = Regex::new(
        r"(?i)(?:PULSE|\bPR|\bHR)(?:\s*/\s*min)?\s*:?\s*([0-9]+)"
    ).unwrap();

    // Everything the bare-number fallback does not need
    pub static ref NOISE: Regex = Regex::new(r"[^0-9\s/\-]").unwrap();
}

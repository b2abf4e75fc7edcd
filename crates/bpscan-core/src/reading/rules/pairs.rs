//! Systolic/diastolic pair strategies: `120/80` and `SYS 120 DIA 80`.

use regex::Captures;
use tracing::trace;

use super::patterns::{LABELED_SYS_DIA, SLASH_PAIR};
use super::{is_candidate, Candidate, ExtractionMatch};

/// Two candidate numbers separated by `/` or `-`.
pub fn slash_pair(text: &str) -> Option<ExtractionMatch<Candidate>> {
    let caps = SLASH_PAIR.captures(text)?;
    let sys = is_candidate(&caps[1])?;
    let dia = is_candidate(&caps[2])?;

    trace!("slash pair {}/{}", sys, dia);
    Some(pair_match(text, &caps, sys, dia, 0.9))
}

/// `SYS` followed by a number, then later `DIA` followed by a number.
///
/// Labels are matched case-insensitively. The first label pair whose
/// numbers are both candidates wins.
pub fn labeled(text: &str) -> Option<ExtractionMatch<Candidate>> {
    LABELED_SYS_DIA.captures_iter(text).find_map(|caps| {
        let sys = is_candidate(&caps[1])?;
        let dia = is_candidate(&caps[2])?;

        trace!("labeled SYS {} DIA {}", sys, dia);
        Some(pair_match(text, &caps, sys, dia, 0.95))
    })
}

fn pair_match(
    text: &str,
    caps: &Captures<'_>,
    sys: u16,
    dia: u16,
    confidence: f32,
) -> ExtractionMatch<Candidate> {
    let start = caps.get(1).map(|m| m.start()).unwrap_or(0);
    let end = caps.get(2).map(|m| m.end()).unwrap_or(text.len());

    ExtractionMatch::new(
        Candidate {
            sys,
            dia,
            pulse: None,
        },
        confidence,
        &text[start..end],
    )
    .with_position(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(m: Option<ExtractionMatch<Candidate>>) -> Option<(u16, u16)> {
        m.map(|m| (m.value.sys, m.value.dia))
    }

    #[test]
    fn test_slash_pair() {
        assert_eq!(values(slash_pair("120/80")), Some((120, 80)));
        assert_eq!(values(slash_pair("BP 135 / 88 mmHg")), Some((135, 88)));
        assert_eq!(values(slash_pair("118-76")), Some((118, 76)));
    }

    #[test]
    fn test_slash_pair_position() {
        let m = slash_pair("BP: 120/80 today").unwrap();
        assert_eq!(m.position, Some((4, 10)));
        assert_eq!(m.source, "120/80");
    }

    #[test]
    fn test_slash_pair_rejects_non_candidates() {
        assert_eq!(values(slash_pair("1200/80")), None);
        assert_eq!(values(slash_pair("12/05")), None);
        assert_eq!(values(slash_pair("120 80")), None);
        assert_eq!(values(slash_pair("2024-1/5")), None);
    }

    #[test]
    fn test_labeled() {
        assert_eq!(values(labeled("SYS 125 DIA 82")), Some((125, 82)));
        assert_eq!(values(labeled("sys: 125\ndia: 82")), Some((125, 82)));
        assert_eq!(values(labeled("SYS125DIA82")), Some((125, 82)));
        assert_eq!(
            values(labeled("Systolic (SYS): 131, Diastolic (DIA): 85")),
            Some((131, 85))
        );
    }

    #[test]
    fn test_labeled_json_reply() {
        let reply = r#"{"sys": "128", "dia": "84", "pulse": "66"}"#;
        assert_eq!(values(labeled(reply)), Some((128, 84)));
    }

    #[test]
    fn test_labeled_requires_both_labels() {
        assert_eq!(values(labeled("SYS 125 82")), None);
        assert_eq!(values(labeled("DIA 82 SYS 125")), None);
        assert_eq!(values(labeled("SYS 1250 DIA 82")), None);
    }
}

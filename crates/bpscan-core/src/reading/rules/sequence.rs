//! Positional strategies: three numbers in a row, and the bare-number fallback.

use std::borrow::Cow;

use tracing::trace;

use super::patterns::{DIGIT_RUN, NOISE, TRIPLE};
use super::{is_candidate, Candidate, ExtractionMatch};

/// Three candidate numbers separated only by non-digit runs.
///
/// First is systolic, second diastolic, third a positional pulse guess.
pub fn triple(text: &str) -> Option<ExtractionMatch<Candidate>> {
    let caps = TRIPLE.captures(text)?;
    let sys = is_candidate(&caps[1])?;
    let dia = is_candidate(&caps[2])?;
    let pulse = is_candidate(&caps[3])?;

    let start = caps.get(1)?.start();
    let end = caps.get(3)?.end();

    trace!("triple {} {} {}", sys, dia, pulse);
    Some(
        ExtractionMatch::new(
            Candidate {
                sys,
                dia,
                pulse: Some(pulse),
            },
            0.7,
            &text[start..end],
        )
        .with_position(start, end),
    )
}

/// All candidate numbers in order of appearance, with their byte spans.
pub fn candidate_numbers(text: &str) -> Vec<(u16, usize, usize)> {
    DIGIT_RUN
        .find_iter(text)
        .filter_map(|m| is_candidate(m.as_str()).map(|n| (n, m.start(), m.end())))
        .collect()
}

/// Fallback: first two candidate numbers anywhere, plus a third as pulse.
///
/// Fewer than two candidates yields no match.
pub fn bare_numbers(text: &str) -> Option<ExtractionMatch<Candidate>> {
    let numbers = candidate_numbers(text);
    if numbers.len() < 2 {
        return None;
    }

    let (sys, start, _) = numbers[0];
    let dia = numbers[1].0;
    let pulse = numbers.get(2).map(|n| n.0);
    let end = numbers.get(2).unwrap_or(&numbers[1]).2;

    trace!("bare numbers {:?}", numbers.iter().map(|n| n.0).collect::<Vec<_>>());
    Some(
        ExtractionMatch::new(Candidate { sys, dia, pulse }, 0.5, &text[start..end])
            .with_position(start, end),
    )
}

/// Replace everything except digits, whitespace, `/` and `-` with spaces.
///
/// Removed characters become spaces rather than vanishing so that digit
/// runs separated by a letter are never glued into one longer number.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    NOISE.replace_all(text, " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(m: Option<ExtractionMatch<Candidate>>) -> Option<(u16, u16, Option<u16>)> {
        m.map(|m| (m.value.sys, m.value.dia, m.value.pulse))
    }

    #[test]
    fn test_triple() {
        assert_eq!(values(triple("130 85 68")), Some((130, 85, Some(68))));
        assert_eq!(values(triple("130\n85\n68")), Some((130, 85, Some(68))));
        assert_eq!(values(triple("mmHg 142 mmHg 91 /min 77")), Some((142, 91, Some(77))));
    }

    #[test]
    fn test_triple_skips_long_numbers() {
        assert_eq!(values(triple("2024 130 85 68")), Some((130, 85, Some(68))));
        assert_eq!(values(triple("130 85 6")), None);
        assert_eq!(values(triple("130 85 6800")), None);
    }

    #[test]
    fn test_candidate_numbers() {
        let numbers: Vec<u16> = candidate_numbers("M1 120 x 080 y 75 z 1234 99")
            .into_iter()
            .map(|n| n.0)
            .collect();
        assert_eq!(numbers, vec![120, 75, 99]);
    }

    #[test]
    fn test_bare_numbers() {
        assert_eq!(values(bare_numbers("a120b80")), Some((120, 80, None)));
        assert_eq!(values(bare_numbers("128 then 7 then 84 then 60")), Some((128, 84, Some(60))));
        assert_eq!(values(bare_numbers("only 120")), None);
        assert_eq!(values(bare_numbers("nothing")), None);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("SYS:120/DIA:80"), "    120/    80");
        assert_eq!(sanitize("120 - 80"), "120 - 80");
        assert!(matches!(sanitize("120/80"), Cow::Borrowed(_)));
    }
}

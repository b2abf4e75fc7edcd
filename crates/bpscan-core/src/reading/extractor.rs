//! Ordered-strategy reading extractor.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::config::ExtractionConfig;
use crate::models::reading::{Field, Reading};

use super::rules::{pulse_label, sanitize, Candidate, ExtractionMatch, Strategy};

/// Where the pulse value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseSource {
    /// An explicit `PULSE`/`PR`/`HR` label.
    Label,
    /// The third number of a positional strategy.
    Position,
}

/// Non-fatal conditions observed while extracting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    /// Fewer than two candidate numbers anywhere in the text.
    NoNumericContent,
    /// A captured value fell outside its bounds and was dropped.
    OutOfPhysiologicalRange { field: Field, value: u16 },
    /// Pulse taken from position alone, without a label.
    AmbiguousPulse { value: u16 },
    /// A labeled pulse overrode a different positional value.
    PulseDisagreement { labeled: u16, positional: u16 },
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionWarning::NoNumericContent => write!(f, "no numeric content found"),
            ExtractionWarning::OutOfPhysiologicalRange { field, value } => {
                let bounds = field.bounds();
                write!(
                    f,
                    "{} value {} outside {}-{}, dropped",
                    field, value, bounds.min, bounds.max
                )
            }
            ExtractionWarning::AmbiguousPulse { value } => {
                write!(f, "pulse {} guessed from position, no label found", value)
            }
            ExtractionWarning::PulseDisagreement { labeled, positional } => write!(
                f,
                "labeled pulse {} overrides positional value {}",
                labeled, positional
            ),
        }
    }
}

/// Result of reading extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Validated reading.
    pub reading: Reading,
    /// Strategy that produced the match, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    /// Origin of the pulse value, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_source: Option<PulseSource>,
    /// Confidence of the winning strategy (0.0 when nothing matched).
    pub confidence: f32,
    /// Extraction warnings.
    pub warnings: Vec<ExtractionWarning>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Wrap a reading the provider already returned as structured data.
    ///
    /// Bounds still apply; dropped fields are reported as warnings.
    pub fn structured(mut reading: Reading) -> Self {
        let warnings = reading
            .validate()
            .into_iter()
            .map(|(field, value)| ExtractionWarning::OutOfPhysiologicalRange { field, value })
            .collect();

        Self {
            reading,
            strategy: None,
            pulse_source: reading.pulse.map(|_| PulseSource::Label),
            confidence: 0.95,
            warnings,
            processing_time_ms: 0,
        }
    }

    fn empty(warnings: Vec<ExtractionWarning>, start: Instant) -> Self {
        Self {
            reading: Reading::default(),
            strategy: None,
            pulse_source: None,
            confidence: 0.0,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Extracts a blood-pressure reading from untrusted recognized text.
///
/// Stateless and infallible: any text yields a (possibly empty) reading.
#[derive(Debug, Clone)]
pub struct ReadingExtractor {
    /// Strip noise characters before the bare-number fallback.
    sanitize_fallback: bool,
}

impl ReadingExtractor {
    /// Create a new extractor with default settings.
    pub fn new() -> Self {
        Self {
            sanitize_fallback: true,
        }
    }

    /// Create an extractor from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new().with_sanitized_fallback(config.sanitize_fallback)
    }

    /// Set fallback sanitization.
    pub fn with_sanitized_fallback(mut self, sanitize: bool) -> Self {
        self.sanitize_fallback = sanitize;
        self
    }

    /// Extract a validated reading.
    pub fn extract(&self, text: &str) -> Reading {
        self.extract_detailed(text).reading
    }

    /// Extract a validated reading together with how it was found.
    pub fn extract_detailed(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        debug!("Extracting reading from {} characters of text", text.len());

        let Some((strategy, found)) = self.first_match(text) else {
            debug!("No strategy matched");
            return ExtractionResult::empty(vec![ExtractionWarning::NoNumericContent], start);
        };

        let mut warnings = Vec::new();
        let Candidate { sys, dia, pulse } = found.value;
        let labeled = if strategy.resolves_pulse_label() {
            pulse_label(text).map(|m| m.value)
        } else {
            None
        };

        let (pulse, pulse_source) = match (labeled, pulse) {
            (Some(labeled), positional) => {
                if let Some(positional) = positional.filter(|&p| p != labeled) {
                    warnings.push(ExtractionWarning::PulseDisagreement {
                        labeled,
                        positional,
                    });
                }
                (Some(labeled), Some(PulseSource::Label))
            }
            (None, Some(positional)) => {
                warnings.push(ExtractionWarning::AmbiguousPulse { value: positional });
                (Some(positional), Some(PulseSource::Position))
            }
            (None, None) => (None, None),
        };

        let mut reading = Reading::new(Some(sys), Some(dia), pulse);
        for (field, value) in reading.validate() {
            warnings.push(ExtractionWarning::OutOfPhysiologicalRange { field, value });
        }

        info!(
            "Extracted reading {} via {} strategy ({} warnings)",
            reading,
            strategy,
            warnings.len()
        );

        ExtractionResult {
            reading,
            strategy: Some(strategy),
            pulse_source: reading.pulse.and(pulse_source),
            confidence: found.confidence,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn first_match(&self, text: &str) -> Option<(Strategy, ExtractionMatch<Candidate>)> {
        Strategy::ORDER.into_iter().find_map(|strategy| {
            let found = match strategy {
                Strategy::BareNumbers if self.sanitize_fallback => {
                    strategy.apply(&sanitize(text))
                }
                _ => strategy.apply(text),
            };
            if let Some(found) = &found {
                debug!("Strategy {} matched {:?}", strategy, found.source);
            }
            found.map(|found| (strategy, found))
        })
    }
}

impl Default for ReadingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a reading from text with default settings.
pub fn extract_reading(text: &str) -> Reading {
    ReadingExtractor::new().extract(text)
}

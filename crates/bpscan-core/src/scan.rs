//! One image, one provider round trip, one reading.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::config::{PromptMode, ProviderKind};
use crate::models::reading::Reading;
use crate::payload::ImagePayload;
use crate::reading::{ExtractionResult, ReadingExtractor};
use crate::vision::{Transcription, VisionClient};

/// Outcome of scanning a single photo.
///
/// `NoText` (the provider produced nothing) and `Unreadable` (text but no
/// numbers) are kept apart so callers can tell a provider failure from an
/// extraction failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Provider returned no text.
    NoText,
    /// Text was returned but no reading could be extracted.
    Unreadable { text: String, result: ExtractionResult },
    /// A (possibly partial) reading was extracted.
    Read { text: String, result: ExtractionResult },
}

impl ScanOutcome {
    /// Classify a transcription by running the extractor over it.
    pub fn from_transcription(
        transcription: Transcription,
        extractor: &ReadingExtractor,
        mode: PromptMode,
    ) -> Self {
        let Transcription::Text(text) = transcription else {
            return ScanOutcome::NoText;
        };

        let structured = match mode {
            PromptMode::Json => Reading::from_json_reply(&text).map(ExtractionResult::structured),
            PromptMode::Describe => None,
        };
        let result = structured.unwrap_or_else(|| {
            debug!("Running pattern extraction on provider text");
            extractor.extract_detailed(&text)
        });

        if result.reading.is_empty() {
            ScanOutcome::Unreadable { text, result }
        } else {
            ScanOutcome::Read { text, result }
        }
    }

    /// The extracted reading; empty unless the outcome is `Read`.
    pub fn reading(&self) -> Reading {
        match self {
            ScanOutcome::Read { result, .. } => result.reading,
            _ => Reading::default(),
        }
    }

    /// Provider text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            ScanOutcome::NoText => None,
            ScanOutcome::Unreadable { text, .. } | ScanOutcome::Read { text, .. } => Some(text),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            ScanOutcome::NoText => "no_text",
            ScanOutcome::Unreadable { .. } => "unreadable",
            ScanOutcome::Read { .. } => "read",
        }
    }
}

/// Scan outcome with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(flatten)]
    pub outcome: ScanOutcome,
    pub provider: ProviderKind,
    pub model: String,
    pub scanned_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

/// Couples a vision client with the reading extractor.
#[derive(Debug, Clone)]
pub struct Scanner {
    client: VisionClient,
    extractor: ReadingExtractor,
}

impl Scanner {
    pub fn new(client: VisionClient, extractor: ReadingExtractor) -> Self {
        Self { client, extractor }
    }

    pub fn client(&self) -> &VisionClient {
        &self.client
    }

    pub fn extractor(&self) -> &ReadingExtractor {
        &self.extractor
    }

    /// Transcribe one image and extract a reading from the transcription.
    pub async fn scan(&self, image: &ImagePayload) -> Result<ScanReport> {
        let start = Instant::now();
        let transcription = self.client.transcribe(image).await?;
        let outcome =
            ScanOutcome::from_transcription(transcription, &self.extractor, self.client.prompt_mode());

        info!("Scan finished: {}", outcome.status());

        Ok(ScanReport {
            outcome,
            provider: self.client.provider(),
            model: self.client.model().to_string(),
            scanned_at: Utc::now(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(transcription: Transcription, mode: PromptMode) -> ScanOutcome {
        ScanOutcome::from_transcription(transcription, &ReadingExtractor::new(), mode)
    }

    #[test]
    fn test_no_text_is_distinct_from_unreadable() {
        let none = classify(Transcription::NoText, PromptMode::Describe);
        let unreadable = classify(
            Transcription::from_text("The screen is too blurry to read."),
            PromptMode::Describe,
        );

        assert_eq!(none, ScanOutcome::NoText);
        assert_eq!(unreadable.status(), "unreadable");
        assert!(unreadable.reading().is_empty());
        assert_eq!(unreadable.text(), Some("The screen is too blurry to read."));
    }

    #[test]
    fn test_describe_mode_reads_text() {
        let outcome = classify(
            Transcription::from_text("SYS 122\nDIA 79\nPULSE 66"),
            PromptMode::Describe,
        );
        assert_eq!(outcome.status(), "read");
        assert_eq!(outcome.reading(), Reading::new(Some(122), Some(79), Some(66)));
    }

    #[test]
    fn test_json_mode_prefers_structured_reply() {
        let outcome = classify(
            Transcription::from_text(r#"{"sys": "117", "dia": "74", "pulse": "59"}"#),
            PromptMode::Json,
        );
        let ScanOutcome::Read { result, .. } = outcome else {
            panic!("expected a reading");
        };
        assert_eq!(result.reading, Reading::new(Some(117), Some(74), Some(59)));
        assert_eq!(result.strategy, None);
    }

    #[test]
    fn test_json_mode_falls_back_to_patterns() {
        let outcome = classify(Transcription::from_text("I see 128/83."), PromptMode::Json);
        assert_eq!(outcome.reading(), Reading::new(Some(128), Some(83), None));
    }

    #[test]
    fn test_serialized_status_tag() {
        let json = serde_json::to_value(ScanOutcome::NoText).unwrap();
        assert_eq!(json["status"], "no_text");
    }
}

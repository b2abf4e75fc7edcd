//! OCR/vision provider client.
//!
//! The provider is an untrusted text source: it receives one image and
//! returns whatever transcription it produces.

mod client;
pub mod response;

pub use client::VisionClient;

use serde::{Deserialize, Serialize};

/// Provider output for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Transcription {
    /// Non-empty transcription text.
    Text(String),
    /// Provider answered but produced no text.
    NoText,
}

impl Transcription {
    /// Classify raw provider text; blank text is [`Transcription::NoText`].
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Transcription::NoText
        } else {
            Transcription::Text(trimmed.to_string())
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Transcription::Text(text) => Some(text),
            Transcription::NoText => None,
        }
    }
}

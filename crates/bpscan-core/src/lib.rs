//! Core library for reading blood-pressure monitor photos.
//!
//! This crate provides:
//! - Reading extraction from untrusted OCR/vision text (ordered pattern
//!   strategies, pulse label resolution, physiological bounds)
//! - Image payload checks (base64, format, size)
//! - A client for the supported vision providers (OpenAI, Gemini)
//! - Configuration models shared by the CLI and HTTP surface

pub mod error;
pub mod models;
pub mod payload;
pub mod reading;
pub mod scan;
pub mod vision;

pub use error::{BpscanError, ImageError, Result, VisionError};
pub use models::config::{BpscanConfig, PromptMode, ProviderKind};
pub use models::reading::{Field, Reading};
pub use payload::ImagePayload;
pub use reading::{
    extract_reading, ExtractionResult, ExtractionWarning, PulseSource, ReadingExtractor, Strategy,
};
pub use scan::{ScanOutcome, ScanReport, Scanner};
pub use vision::{Transcription, VisionClient};

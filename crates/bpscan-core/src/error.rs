//! Error types for the bpscan-core library.
//!
//! Reading extraction never fails; these errors cover the plumbing around
//! it (image payloads, vision provider calls, configuration).

use thiserror::Error;

/// Main error type for the bpscan library.
#[derive(Error, Debug)]
pub enum BpscanError {
    /// Vision provider error.
    #[error("vision error: {0}")]
    Vision(#[from] VisionError),

    /// Image payload error.
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to the uploaded image payload.
#[derive(Error, Debug)]
pub enum ImageError {
    /// No image data was supplied.
    #[error("no image provided")]
    Missing,

    /// Payload is not valid base64.
    #[error("image must be valid base64 data")]
    InvalidBase64,

    /// Decoded bytes are not a supported image format.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Decoded payload exceeds the configured limit.
    #[error("image too large: {size_kb} KB (maximum {max_kb} KB)")]
    TooLarge { size_kb: usize, max_kb: usize },
}

/// Errors related to calling an OCR/vision provider.
#[derive(Error, Debug)]
pub enum VisionError {
    /// API key is not configured for the selected provider.
    #[error("{0} API key not configured")]
    MissingApiKey(&'static str),

    /// Provider rejected the API key (HTTP 401).
    #[error("invalid API key - check your {0} API key")]
    InvalidApiKey(&'static str),

    /// Provider rate limit hit (HTTP 429).
    #[error("rate limit exceeded - please wait and try again")]
    RateLimited,

    /// Any other non-success status from the provider.
    #[error("vision API request failed: status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Provider answered without any choices/candidates.
    #[error("empty response from vision API")]
    EmptyResponse,

    /// Transport-level failure (DNS, TLS, timeout, malformed JSON).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for the bpscan library.
pub type Result<T> = std::result::Result<T, BpscanError>;

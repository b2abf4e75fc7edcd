//! Configuration structures for the scanning pipeline.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable selecting the vision provider.
pub const PROVIDER_ENV: &str = "BPSCAN_PROVIDER";

/// Main configuration for bpscan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BpscanConfig {
    /// Vision provider configuration.
    pub vision: VisionConfig,

    /// Reading extraction configuration.
    pub extraction: ExtractionConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// Supported OCR/vision providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions with image input.
    #[default]
    OpenAi,
    /// Google Gemini generateContent.
    Gemini,
}

impl ProviderKind {
    /// Human-readable provider name.
    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }

    /// Environment variable holding the API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(format!("unknown vision provider: {}", other)),
        }
    }
}

/// What the provider is asked to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Free-text description of everything on the display.
    #[default]
    Describe,
    /// A `{"sys", "dia", "pulse"}` JSON object.
    Json,
}

impl PromptMode {
    /// Prompt sent alongside the image.
    pub fn prompt(self) -> &'static str {
        match self {
            PromptMode::Describe => {
                "Look at this blood pressure monitor display and tell me exactly what numbers \
                 and text you can see. Look for systolic (SYS), diastolic (DIA), and pulse \
                 values. Just describe what you see on the screen."
            }
            PromptMode::Json => {
                "Extract the systolic (SYS), diastolic (DIA), and pulse (PULSE) values from \
                 this blood pressure monitor image. Return only in JSON format: \
                 {\"sys\": \"value\", \"dia\": \"value\", \"pulse\": \"value\"}"
            }
        }
    }
}

/// Vision provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Which provider to call.
    pub provider: ProviderKind,

    /// Prompt mode.
    pub prompt_mode: PromptMode,

    /// OpenAI model name.
    pub openai_model: String,

    /// Gemini model name.
    pub gemini_model: String,

    /// Image detail level requested from OpenAI.
    pub detail: String,

    /// Maximum tokens in the provider reply.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum decoded image size in KB.
    pub max_image_kb: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            prompt_mode: PromptMode::Describe,
            openai_model: "gpt-4o".to_string(),
            gemini_model: "gemini-2.0-flash".to_string(),
            detail: "high".to_string(),
            max_tokens: 300,
            temperature: 0.0,
            timeout_secs: 30,
            max_image_kb: 10 * 1024,
        }
    }
}

impl VisionConfig {
    /// Model name for the selected provider.
    pub fn model(&self) -> &str {
        match self.provider {
            ProviderKind::OpenAi => &self.openai_model,
            ProviderKind::Gemini => &self.gemini_model,
        }
    }
}

/// Reading extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Strip noise characters before the bare-number fallback.
    pub sanitize_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sanitize_fallback: true,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl BpscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), String> {
        if let Ok(provider) = std::env::var(PROVIDER_ENV) {
            self.vision.provider = provider.parse()?;
        }
        Ok(())
    }
}

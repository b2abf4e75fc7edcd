//! HTTP client for the supported vision providers.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::VisionError;
use crate::models::config::{PromptMode, ProviderKind, VisionConfig};
use crate::payload::ImagePayload;

use super::response::{gemini_transcription, openai_transcription, status_error};
use super::Transcription;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// One configured vision provider with its credentials.
#[derive(Debug, Clone)]
pub struct VisionClient {
    config: VisionConfig,
    api_key: String,
    http: reqwest::Client,
}

impl VisionClient {
    /// Create a client with an explicit API key.
    pub fn new(config: VisionConfig, api_key: impl Into<String>) -> Result<Self, VisionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(VisionError::MissingApiKey(config.provider.name()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            api_key,
            http,
        })
    }

    /// Create a client reading the provider's API key from the environment.
    pub fn from_env(config: VisionConfig) -> Result<Self, VisionError> {
        let provider = config.provider;
        let api_key = std::env::var(provider.api_key_env())
            .map_err(|_| VisionError::MissingApiKey(provider.name()))?;

        debug!(
            "{} API key found ({} characters)",
            provider.name(),
            api_key.len()
        );
        Self::new(config, api_key)
    }

    pub fn provider(&self) -> ProviderKind {
        self.config.provider
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    pub fn prompt_mode(&self) -> PromptMode {
        self.config.prompt_mode
    }

    /// Send one image to the provider and return its transcription.
    pub async fn transcribe(&self, image: &ImagePayload) -> Result<Transcription, VisionError> {
        info!(
            "Sending {} KB {} image to {} ({})",
            image.size_kb(),
            image.mime_type(),
            self.config.provider.name(),
            self.model()
        );

        let transcription = match self.config.provider {
            ProviderKind::OpenAi => self.transcribe_openai(image).await?,
            ProviderKind::Gemini => self.transcribe_gemini(image).await?,
        };

        match &transcription {
            Transcription::Text(text) => debug!("Transcription: {}", text),
            Transcription::NoText => warn!("Provider returned no text"),
        }

        Ok(transcription)
    }

    async fn transcribe_openai(&self, image: &ImagePayload) -> Result<Transcription, VisionError> {
        let body = json!({
            "model": self.config.openai_model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": self.config.prompt_mode.prompt() },
                    { "type": "image_url",
                      "image_url": { "url": image.to_data_url(), "detail": self.config.detail } }
                ]
            }],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature
        });

        let resp = self
            .http
            .post(OPENAI_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let json = self.read_json(resp).await?;
        openai_transcription(&json)
    }

    async fn transcribe_gemini(&self, image: &ImagePayload) -> Result<Transcription, VisionError> {
        let url = format!("{}/{}:generateContent", GEMINI_URL, self.config.gemini_model);
        let body = json!({
            "contents": [{ "parts": [
                { "text": self.config.prompt_mode.prompt() },
                { "inline_data": { "mime_type": image.mime_type(), "data": image.to_base64() } }
            ]}],
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature
            }
        });

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let json = self.read_json(resp).await?;
        gemini_transcription(&json)
    }

    async fn read_json(&self, resp: reqwest::Response) -> Result<Value, VisionError> {
        let status = resp.status();
        debug!("{} response status: {}", self.config.provider.name(), status);

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("{} API error: {}", self.config.provider.name(), body);
            return Err(status_error(self.config.provider, status, body));
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_api_key_rejected() {
        let err = VisionClient::new(VisionConfig::default(), "  ").unwrap_err();
        assert!(matches!(err, VisionError::MissingApiKey("OpenAI")));
    }

    #[test]
    fn test_client_reports_provider_and_model() {
        let config = VisionConfig {
            provider: ProviderKind::Gemini,
            ..VisionConfig::default()
        };
        let client = VisionClient::new(config, "test-key").unwrap();
        assert_eq!(client.provider(), ProviderKind::Gemini);
        assert_eq!(client.model(), "gemini-2.0-flash");
        assert_eq!(client.prompt_mode(), PromptMode::Describe);
    }
}

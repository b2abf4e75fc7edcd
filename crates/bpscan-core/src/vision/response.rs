//! Provider response decoding.

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::VisionError;
use crate::models::config::ProviderKind;

use super::Transcription;

/// Map a non-success HTTP status to a typed error.
pub fn status_error(provider: ProviderKind, status: StatusCode, body: String) -> VisionError {
    match status {
        StatusCode::UNAUTHORIZED => VisionError::InvalidApiKey(provider.name()),
        StatusCode::TOO_MANY_REQUESTS => VisionError::RateLimited,
        _ => VisionError::Upstream {
            status: status.as_u16(),
            body,
        },
    }
}

/// Text of the first choice in an OpenAI chat completion.
pub fn openai_transcription(json: &Value) -> Result<Transcription, VisionError> {
    let choice = json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or(VisionError::EmptyResponse)?;

    Ok(Transcription::from_text(
        choice["message"]["content"].as_str().unwrap_or(""),
    ))
}

/// Concatenated text parts of the first Gemini candidate.
pub fn gemini_transcription(json: &Value) -> Result<Transcription, VisionError> {
    let candidate = json["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .ok_or(VisionError::EmptyResponse)?;

    let text = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    Ok(Transcription::from_text(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_openai_text() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  SYS 120\nDIA 80  " } }]
        });
        assert_eq!(
            openai_transcription(&body).unwrap(),
            Transcription::Text("SYS 120\nDIA 80".to_string())
        );
    }

    #[test]
    fn test_openai_blank_content_is_no_text() {
        let body = json!({ "choices": [{ "message": { "content": "   " } }] });
        assert_eq!(openai_transcription(&body).unwrap(), Transcription::NoText);

        let body = json!({ "choices": [{ "message": {} }] });
        assert_eq!(openai_transcription(&body).unwrap(), Transcription::NoText);
    }

    #[test]
    fn test_openai_no_choices() {
        assert!(matches!(
            openai_transcription(&json!({ "choices": [] })),
            Err(VisionError::EmptyResponse)
        ));
        assert!(matches!(
            openai_transcription(&json!({})),
            Err(VisionError::EmptyResponse)
        ));
    }

    #[test]
    fn test_gemini_parts_joined() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "SYS 131" }, { "text": "DIA 84" }] } }]
        });
        assert_eq!(
            gemini_transcription(&body).unwrap(),
            Transcription::Text("SYS 131\nDIA 84".to_string())
        );
    }

    #[test]
    fn test_gemini_no_candidates() {
        assert!(matches!(
            gemini_transcription(&json!({ "promptFeedback": {} })),
            Err(VisionError::EmptyResponse)
        ));
    }

    #[test]
    fn test_status_errors() {
        assert!(matches!(
            status_error(ProviderKind::OpenAi, StatusCode::UNAUTHORIZED, String::new()),
            VisionError::InvalidApiKey("OpenAI")
        ));
        assert!(matches!(
            status_error(ProviderKind::Gemini, StatusCode::TOO_MANY_REQUESTS, String::new()),
            VisionError::RateLimited
        ));
        assert!(matches!(
            status_error(ProviderKind::OpenAi, StatusCode::BAD_GATEWAY, "oops".into()),
            VisionError::Upstream { status: 502, .. }
        ));
    }
}

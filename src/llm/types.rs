//! Wire types for the Gemini `generateContent` REST API.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Request body for `generateContent` / `streamGenerateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A turn of content made of text parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.response_mime_type.is_none()
            && self.response_schema.is_none()
    }

    /// `None` when no field is set, so the key is omitted from the body.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Response body (also the payload of each streamed SSE event).
///
/// A stream can end with an event carrying only `error`, even after a 200.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

impl GenerateContentResponse {
    /// Turn an in-body `error` into `RequestFailed`.
    pub fn into_result(self, provider: &str) -> Result<Self, LlmError> {
        match self.error {
            Some(err) => Err(LlmError::RequestFailed {
                provider: provider.to_string(),
                reason: match err.code {
                    Some(code) => format!("error {code}: {}", err.message),
                    None => err.message,
                },
            }),
            None => Ok(self),
        }
    }

    /// Text of the first candidate, all parts concatenated.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    pub fn finish_reason(&self) -> Option<String> {
        self.candidates.first().and_then(|c| c.finish_reason.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u32>,
    #[serde(default)]
    pub candidates_token_count: Option<u32>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_concatenates_parts_of_first_candidate() {
        let raw = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hello"}, {"text": ", world"}]},
                 "finishReason": "STOP"},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text(), "Hello, world");
        assert_eq!(response.finish_reason().as_deref(), Some("STOP"));
        assert_eq!(
            response.usage_metadata.unwrap().prompt_token_count,
            Some(12)
        );
    }

    #[test]
    fn text_empty_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), "");
    }

    #[test]
    fn error_body_becomes_request_failed() {
        let raw = r#"{"error":{"code":500,"message":"Internal error encountered."}}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        match response.into_result("gemini").unwrap_err() {
            LlmError::RequestFailed { reason, .. } => {
                assert_eq!(reason, "error 500: Internal error encountered.")
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn response_without_error_passes_through() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.into_result("gemini").unwrap().text(), "ok");
    }

    #[test]
    fn request_serializes_camel_case_and_omits_empty_config() {
        let request = GenerateContentRequest {
            system_instruction: Some(Content::text(None, "be nice")),
            contents: vec![Content::text(Some("user"), "hi")],
            generation_config: GenerationConfig::default().into_option(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be nice");
        assert_eq!(json["contents"][0]["role"], "user");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn generation_config_serializes_schema() {
        let config = GenerationConfig {
            response_mime_type: Some("application/json".into()),
            response_schema: Some(serde_json::json!({"type": "OBJECT"})),
            ..Default::default()
        };
        let json = serde_json::to_value(config.into_option().unwrap()).unwrap();
        assert_eq!(json["responseMimeType"], "application/json");
        assert_eq!(json["responseSchema"]["type"], "OBJECT");
        assert!(json.get("temperature").is_none());
    }
}

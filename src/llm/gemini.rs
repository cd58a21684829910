//! Gemini provider over the `generateContent` REST API.

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace, warn};

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ResponseFormat, Role, TextStream,
};
use crate::llm::sse::{LineBuffer, parse_sse_line};
use crate::llm::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

const PROVIDER: &str = "gemini";

/// Buffered fragments between the body reader and the consumer.
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Gemini REST client.
pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GeminiProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    /// Fails before any network I/O when the credential is missing.
    fn resolve_api_key(&self) -> Result<&str, LlmError> {
        match &self.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => Ok(key.expose_secret()),
            _ => Err(LlmError::NotConfigured {
                provider: PROVIDER.to_string(),
                reason: "API key is missing. Set GEMINI_API_KEY (or API_KEY) in the environment."
                    .to_string(),
            }),
        }
    }

    async fn post(
        &self,
        url: &str,
        request: &CompletionRequest,
    ) -> Result<reqwest::Response, LlmError> {
        let api_key = self.resolve_api_key()?;
        let body = build_request_body(request);

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            json = matches!(request.response_format, ResponseFormat::Json { .. }),
            "Sending Gemini request"
        );

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        warn!(status = status.as_u16(), message = %message, "Gemini request rejected");

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
                reason: message,
            });
        }
        Err(LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: format!("HTTP {status}: {message}"),
        })
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.endpoint("generateContent");
        let response = self.post(&url, &request).await?;

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("failed to decode response body: {e}"),
            })?;
        let parsed = parsed.into_result(PROVIDER)?;

        let usage = parsed.usage_metadata.clone().unwrap_or_default();
        let content = parsed.text();
        debug!(
            model = %self.model,
            chars = content.len(),
            input_tokens = usage.prompt_token_count.unwrap_or(0),
            output_tokens = usage.candidates_token_count.unwrap_or(0),
            "Gemini request complete"
        );

        Ok(CompletionResponse {
            content,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason: parsed.finish_reason(),
        })
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<TextStream, LlmError> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(&url, &request).await?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let model = self.model.clone();

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut lines = LineBuffer::new();

            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(LlmError::RequestFailed {
                                provider: PROVIDER.to_string(),
                                reason: format!("stream read error: {e}"),
                            }))
                            .await;
                        return;
                    }
                };

                for line in lines.push(&bytes) {
                    if !forward_line(&tx, &line).await {
                        return;
                    }
                }
            }

            if let Some(rest) = lines.finish() {
                forward_line(&tx, &rest).await;
            }
            debug!(model = %model, "Gemini stream complete");
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Parse one SSE line and forward its text. Returns `false` once the
/// stream should stop (parse error sent, or receiver dropped).
async fn forward_line(tx: &mpsc::Sender<Result<String, LlmError>>, line: &str) -> bool {
    match parse_sse_line(line) {
        Ok(Some(event)) => {
            let text = event.text();
            if text.is_empty() {
                return true;
            }
            trace!(chars = text.len(), "Streaming fragment");
            if tx.send(Ok(text)).await.is_err() {
                debug!("Stream receiver dropped, stopping");
                return false;
            }
            true
        }
        Ok(None) => true,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

/// Translate a provider-neutral request into the Gemini wire format.
fn build_request_body(request: &CompletionRequest) -> GenerateContentRequest {
    let system_instruction = request
        .system_instruction()
        .map(|text| Content::text(None, text));

    let contents = request
        .messages
        .iter()
        .filter_map(|m| match m.role {
            Role::System => None,
            Role::User => Some(Content::text(Some("user"), m.content.clone())),
            Role::Assistant => Some(Content::text(Some("model"), m.content.clone())),
        })
        .collect();

    let mut config = GenerationConfig {
        temperature: request.temperature,
        ..Default::default()
    };
    if let ResponseFormat::Json { schema } = &request.response_format {
        config.response_mime_type = Some("application/json".to_string());
        config.response_schema = Some(schema.clone());
    }

    GenerateContentRequest {
        system_instruction,
        contents,
        generation_config: config.into_option(),
    }
}

//! Provider abstraction: request/response types and the `LlmProvider` trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Shape the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResponseFormat {
    /// Free-form text (markdown).
    #[default]
    Text,
    /// A JSON document conforming to the given schema declaration.
    Json { schema: serde_json::Value },
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            response_format: ResponseFormat::Text,
            temperature: None,
        }
    }

    pub fn with_json_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_format = ResponseFormat::Json { schema };
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Concatenated system messages, if any.
    pub fn system_instruction(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// A completed (non-streaming) response.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Response text. May be empty when the model produced nothing.
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: Option<String>,
}

/// Ordered, finite, single-consumer stream of text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// A hosted model the pipeline can talk to.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier used for requests.
    fn model_name(&self) -> &str;

    /// Run a request to completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Run a request and yield text fragments as they arrive.
    ///
    /// Errors that happen before the first byte (credential, HTTP status)
    /// are returned directly; errors while reading the body arrive as an
    /// `Err` item and end the stream.
    async fn complete_stream(&self, request: CompletionRequest) -> Result<TextStream, LlmError>;
}

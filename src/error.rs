//! Error types for Homework Helper.

use uuid::Uuid;

use crate::pipeline::stage::Stage;
use crate::pipeline::state::PipelineState;

/// Top-level error type for the helper.
#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),

    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}: {reason}")]
    AuthFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single pipeline stage.
///
/// Stages 1-3 abort the pipeline on any of these; the practice stage
/// records them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{stage} returned empty response")]
    EmptyResponse { stage: Stage },

    #[error("{stage} returned unparseable output: {reason}")]
    Parse { stage: Stage, reason: String },

    #[error("Transport error: {0}")]
    Transport(LlmError),
}

impl From<LlmError> for StageError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured { reason, .. } => Self::Configuration(reason),
            other => Self::Transport(other),
        }
    }
}

impl StageError {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::EmptyResponse { .. } => "empty_response",
            Self::Parse { .. } => "parse",
            Self::Transport(_) => "transport",
        }
    }
}

/// Trace log store errors.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Log entry {id} not found")]
    NotFound { id: Uuid },

    #[error("Log entry {id} already finished")]
    AlreadyFinished { id: Uuid },
}

/// Transcript errors.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Message {id} not found")]
    NotFound { id: Uuid },

    #[error("Message {id} is closed for edits")]
    Closed { id: Uuid },
}

/// Result type alias for the helper.
pub type Result<T> = std::result::Result<T, HelperError>;

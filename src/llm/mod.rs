//! LLM integration for Homework Helper.
//!
//! The pipeline talks to models only through the [`LlmProvider`] trait.
//! The production implementation is [`GeminiProvider`], a thin reqwest
//! client over Gemini's `generateContent` and `streamGenerateContent`
//! endpoints.

pub mod gemini;
pub mod provider;
pub mod sse;
pub mod types;

pub use gemini::GeminiProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::config::HelperConfig;
use crate::error::LlmError;

/// Connect timeout for the HTTP client. Response bodies are not bounded:
/// a streamed solution can legitimately take a while.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<secrecy::SecretString>,
    pub model: String,
    pub base_url: String,
}

impl From<&HelperConfig> for LlmConfig {
    fn from(config: &HelperConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

/// Create an LLM provider from configuration.
///
/// A missing API key does not fail here; requests fail pre-flight instead.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let http = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| LlmError::RequestFailed {
            provider: "gemini".to_string(),
            reason: format!("Failed to create HTTP client: {}", e),
        })?;

    tracing::info!(
        model = %config.model,
        base_url = %config.base_url,
        has_key = config.api_key.is_some(),
        "Using Gemini"
    );
    Ok(Arc::new(GeminiProvider::new(
        http,
        config.base_url.clone(),
        config.model.clone(),
        config.api_key.clone(),
    )))
}

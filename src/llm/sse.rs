//! SSE (Server-Sent Events) parsing for `streamGenerateContent?alt=sse`.
//!
//! Gemini sends one full `GenerateContentResponse` per event:
//!
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"# Step 1"}]}}]}
//!
//! data: {"candidates":[{"content":{"parts":[{"text":"..."}]}, "finishReason":"STOP"}]}
//! ```
//!
//! There is no `[DONE]` sentinel; the stream ends when the body closes.

use crate::error::LlmError;
use crate::llm::types::GenerateContentResponse;

/// Parse a single SSE line.
///
/// Returns `Ok(None)` for blank lines, comments, and non-`data:` fields.
/// An event carrying `error` is returned as `Err`.
pub fn parse_sse_line(line: &str) -> Result<Option<GenerateContentResponse>, LlmError> {
    let line = line.trim_end_matches(['\r', '\n']).trim_end();

    if line.is_empty() || line.starts_with(':') {
        return Ok(None);
    }

    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim_start();
    if payload.is_empty() {
        return Ok(None);
    }

    let event: GenerateContentResponse =
        serde_json::from_str(payload).map_err(|e| LlmError::InvalidResponse {
            provider: "gemini".to_string(),
            reason: format!("failed to parse SSE event: {e}"),
        })?;
    event.into_result("gemini").map(Some)
}

/// Accumulates raw body bytes and yields complete lines.
///
/// Works on bytes so a multi-byte character split across two network
/// chunks is decoded only once both halves have arrived.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
        }
        lines
    }

    /// Whatever is left once the body has closed.
    pub fn finish(self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        if rest.trim().is_empty() { None } else { Some(rest) }
    }
}

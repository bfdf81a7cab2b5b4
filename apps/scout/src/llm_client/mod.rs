//! LLM Client: the single point of entry for generative backend calls in Scout.
//!
//! ARCHITECTURAL RULE: No other module may call a generative API directly.
//! Every backend implements `CandidateFetcher` and lives in this module.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::warn;

use crate::models::candidate::CandidateBatch;

pub mod gemini;
pub mod ollama;
pub mod prompts;

/// Generative backends can take minutes on a long list; probes should not.
pub const LLM_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A generative backend that proposes company candidates for a prompt.
#[async_trait]
pub trait CandidateFetcher: Send + Sync {
    /// Backend label used in logs and errors.
    fn name(&self) -> &'static str;

    async fn fetch(&self, prompt: &str) -> Result<CandidateBatch, LlmError>;
}

/// Builds the shared reqwest client with a request timeout.
pub fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

/// Turns a non-2xx response into `LlmError::Api`, keeping a bounded slice of the body.
pub(crate) async fn api_error(backend: &str, response: Response) -> LlmError {
    let status = response.status();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    warn!(backend, status = status.as_u16(), "LLM API returned {}: {}", status, body);
    LlmError::Api {
        status: status.as_u16(),
        message: body,
    }
}

/// Strips a Markdown code fence (```json ... ``` or ``` ... ```) from LLM output.
/// Text before the opening fence is discarded along with the language tag.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };

    let rest = &text[open + 3..];
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let body = &rest[tag_len..];

    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_single_line() {
        assert_eq!(strip_json_fences("```json[1, 2]```"), "[1, 2]");
    }

    #[test]
    fn test_strip_json_fences_with_preamble() {
        let input = "Here are the companies:\n```json\n[{\"a\": 1}]\n```\n";
        assert_eq!(strip_json_fences(input), "[{\"a\": 1}]");
    }

    #[test]
    fn test_strip_json_fences_unclosed() {
        assert_eq!(strip_json_fences("```json\n[]\n"), "[]");
    }
}

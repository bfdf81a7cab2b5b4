//! Gemini generate-content backend with Google Search grounding.
//!
//! Grounded replies routinely arrive wrapped in a ```json fence despite the
//! prompt, so the text is unfenced before parsing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{api_error, build_http_client, strip_json_fences, CandidateFetcher, LlmError, LLM_TIMEOUT};
use crate::models::candidate::{parse_candidates, CandidateBatch};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    tools: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenates the text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(GEMINI_API_BASE, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client: build_http_client(LLM_TIMEOUT),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            tools: vec![json!({ "google_search": {} })],
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, MODEL
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(self.name(), response).await);
        }

        let generated: GenerateResponse = response.json().await?;
        let text = generated.text().ok_or(LlmError::EmptyContent)?;

        debug!(chars = text.len(), "Gemini generateContent succeeded");
        Ok(text)
    }
}

#[async_trait]
impl CandidateFetcher for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn fetch(&self, prompt: &str) -> Result<CandidateBatch, LlmError> {
        let text = self.generate(prompt).await?;
        parse_candidates(strip_json_fences(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAYLOAD: &str = r#"[
  {"company_name": "Tempus", "registered_name": "tempus"},
  {"company_name": "Ro", "registered_name": "ro"}
]"#;

    fn reply(parts: &[&str]) -> Value {
        let parts: Vec<Value> = parts.iter().map(|t| json!({ "text": t })).collect();
        json!({
            "candidates": [{ "content": { "role": "model", "parts": parts } }]
        })
    }

    async fn server_replying(body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
            .and(header("x-goog-api-key", "google-key"))
            .and(body_partial_json(json!({ "tools": [{ "google_search": {} }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fenced_reply_parses_like_plain_reply() {
        let fenced = format!("```json\n{PAYLOAD}\n```");

        let plain_server = server_replying(reply(&[PAYLOAD])).await;
        let fenced_server = server_replying(reply(&[fenced.as_str()])).await;

        let plain = GeminiClient::with_base_url(plain_server.uri(), "google-key".to_string())
            .fetch("prompt")
            .await
            .unwrap();
        let unfenced = GeminiClient::with_base_url(fenced_server.uri(), "google-key".to_string())
            .fetch("prompt")
            .await
            .unwrap();

        assert_eq!(plain.len(), 2);
        assert_eq!(plain, unfenced);
    }

    #[tokio::test]
    async fn test_text_parts_are_concatenated() {
        let server = server_replying(reply(&["```json\n[{\"company_name\": \"Ro\", ", "\"registered_name\": \"ro\"}]\n```"])).await;

        let batch = GeminiClient::with_base_url(server.uri(), "google-key".to_string())
            .fetch("prompt")
            .await
            .unwrap();

        assert_eq!(batch.candidates[0].registered_name, "ro");
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_content() {
        let server = server_replying(json!({ "candidates": [] })).await;

        let err = GeminiClient::with_base_url(server.uri(), "google-key".to_string())
            .fetch("prompt")
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = GeminiClient::with_base_url(server.uri(), "google-key".to_string())
            .fetch("prompt")
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
    }
}

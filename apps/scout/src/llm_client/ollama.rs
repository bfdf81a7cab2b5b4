//! Ollama chat backend. The prompt goes in as the system message and the
//! assistant reply is parsed as JSON exactly as returned.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{api_error, build_http_client, CandidateFetcher, LlmError, LLM_TIMEOUT};
use crate::models::candidate::{parse_candidates, CandidateBatch};

pub const MODEL: &str = "gpt-oss:20b";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    tools: Vec<ToolHint>,
}

#[derive(Debug, Serialize)]
struct ToolHint {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    api_key: String,
}

impl OllamaClient {
    pub fn new(host: impl Into<String>, api_key: String) -> Self {
        Self {
            client: build_http_client(LLM_TIMEOUT),
            host: host.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn chat(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                tools: vec![ToolHint { kind: "webSearch" }],
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.host))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(self.name(), response).await);
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .message
            .map(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!(chars = content.len(), "Ollama chat succeeded");
        Ok(content)
    }
}

#[async_trait]
impl CandidateFetcher for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn fetch(&self, prompt: &str) -> Result<CandidateBatch, LlmError> {
        let content = self.chat(prompt).await?;
        parse_candidates(&content)
    }
}

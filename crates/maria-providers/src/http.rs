//! OpenAI-compatible chat client.
//!
//! Talks directly to a `/chat/completions` endpoint via `reqwest`. The agent
//! protocol is plain text (the model answers with a JSON action blob), so no
//! function-calling request fields are needed — just messages, stop
//! sequences, and sampling settings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use maria_core::types::Message;

use crate::traits::{ChatModel, LlmError, LlmRequestConfig};

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    max_tokens: u32,
    temperature: f64,
}

/// Chat completion response (only the fields we read).
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

// ─────────────────────────────────────────────
// OpenAiChatModel
// ─────────────────────────────────────────────

/// Chat model backed by an OpenAI-compatible HTTP API.
pub struct OpenAiChatModel {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Model identifier sent with each request.
    model: String,
    /// Generation settings.
    config: LlmRequestConfig,
}

impl std::fmt::Debug for OpenAiChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatModel")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiChatModel {
    /// Create a new chat client.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        config: LlmRequestConfig,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(OpenAiChatModel {
            client,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            config,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, messages: &[Message], stop: &[String]) -> Result<String, LlmError> {
        debug!(
            model = %self.model,
            messages = messages.len(),
            stop = stop.len(),
            "calling chat model"
        );

        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
            stop: if stop.is_empty() { None } else { Some(stop) },
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %body, "chat API error");
            return Err(LlmError::Api { status, body });
        }

        let chat_resp: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no content in response".to_string()))?;

        debug!(reply_len = content.len(), "chat model responded");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Embeddings client for the policy retrieval index.
//!
//! Same OpenAI-compatible HTTP surface as the chat client, against the
//! `/embeddings` endpoint.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::traits::LlmError;

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

// ─────────────────────────────────────────────
// EmbeddingsClient
// ─────────────────────────────────────────────

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct EmbeddingsClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for EmbeddingsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl EmbeddingsClient {
    /// Create a new embeddings client.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(EmbeddingsClient {
            client,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn embeddings_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/embeddings", base)
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| LlmError::InvalidResponse("missing embedding".to_string()))
    }

    /// Embed a batch of texts, preserving order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        debug!(model = %self.model, texts = texts.len(), "requesting embeddings");

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(self.embeddings_url())
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
            error!(status = %status, body = %body, "embeddings API error");
            return Err(LlmError::Api { status, body });
        }

        let resp: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if resp.data.len() != texts.len() {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                resp.data.len()
            )));
        }

        Ok(resp.data.into_iter().map(|item| item.embedding).collect())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

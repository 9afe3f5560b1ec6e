//! Chat model trait — the LLM boundary of the turn loop.
//!
//! The agent core treats the model as an opaque blocking call: an ordered
//! message sequence plus stop sequences in, one text completion out.
//! Retries and backoff are the collaborator's concern, not the loop's.

use async_trait::async_trait;
use thiserror::Error;

use maria_core::types::Message;

/// Errors from the LLM boundary.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed model response: {0}")]
    InvalidResponse(String),
}

/// Per-call generation settings.
#[derive(Clone, Debug)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.1,
        }
    }
}

/// Trait that all chat backends implement.
///
/// The main implementation is [`crate::http::OpenAiChatModel`], which talks
/// to any OpenAI-compatible `/chat/completions` endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a completion request.
    ///
    /// # Arguments
    /// * `messages` — Ordered role-tagged conversation.
    /// * `stop`     — Stop sequences terminating generation.
    ///
    /// # Returns
    /// The assistant's text reply.
    async fn complete(&self, messages: &[Message], stop: &[String]) -> Result<String, LlmError>;

    /// The model identifier used for requests.
    fn model_name(&self) -> &str;
}

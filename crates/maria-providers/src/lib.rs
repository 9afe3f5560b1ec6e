//! LLM provider layer for Maria.
//!
//! # Architecture
//!
//! - [`traits::ChatModel`] — trait the turn loop calls through
//! - [`http::OpenAiChatModel`] — OpenAI-compatible `/chat/completions` client
//! - [`embeddings::EmbeddingsClient`] — `/embeddings` client for retrieval

pub mod embeddings;
pub mod http;
pub mod traits;

// Re-export main types for convenience
pub use embeddings::EmbeddingsClient;
pub use http::OpenAiChatModel;
pub use traits::{ChatModel, LlmError, LlmRequestConfig};

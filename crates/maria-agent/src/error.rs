//! Turn-level error taxonomy.
//!
//! Recoverable tool problems (malformed structured input, a failed remote
//! call with a sensible explanation) never surface here — tools convert
//! those into observation text so the loop keeps going. What remains is the
//! set of failures that genuinely end a turn.

use thiserror::Error;

use maria_providers::LlmError;

/// A failure that terminates the current turn.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The model reply did not contain a single recognizable JSON action.
    /// Carries the raw text unchanged for diagnostics; not retried.
    #[error("could not parse model output as an action: {reason}\n--- raw output ---\n{raw}")]
    Parse { raw: String, reason: String },

    /// The parsed action names a tool absent from the registry.
    #[error("model requested unknown tool '{name}'")]
    UnknownTool { name: String },

    /// A tool's external effect failed unexpectedly.
    #[error("tool '{name}' failed")]
    Tool {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The model call itself failed.
    #[error("model call failed")]
    Llm(#[from] LlmError),

    /// The turn was cancelled between iterations.
    #[error("turn cancelled")]
    Cancelled,
}

impl TurnError {
    /// The raw model output attached to a parse failure, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            TurnError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

//! Core types for Maria — the data model of the agent turn protocol.
//!
//! The agent speaks a text protocol with the model: every model reply is a
//! single JSON action blob, either the terminal "respond" action or a tool
//! invocation. Rust enums make the two shapes explicit instead of threading
//! loosely-typed dictionaries through the loop.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Who authored a conversation message.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single chat message.
///
/// History is append-only within a session; messages are never mutated after
/// creation. Persistence across turns is the caller's responsibility.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Tool input
// ─────────────────────────────────────────────

/// The `tool_input` value of a parsed action.
///
/// Models emit either a plain string or a structured JSON object; both cross
/// the tool boundary as text, so the shape is preserved here and flattened
/// with [`ToolInput::to_text`] at dispatch time.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolInput {
    /// No `tool_input` key (or an explicit null).
    None,
    /// A plain string input.
    Text(String),
    /// A structured JSON input (object or array).
    Json(serde_json::Value),
}

impl ToolInput {
    /// Render the input as the text a tool receives.
    ///
    /// Structured values serialize to compact JSON; `None` becomes the empty
    /// string.
    pub fn to_text(&self) -> String {
        match self {
            ToolInput::None => String::new(),
            ToolInput::Text(s) => s.clone(),
            ToolInput::Json(v) => v.to_string(),
        }
    }

    /// Whether the action carried no input at all.
    pub fn is_none(&self) -> bool {
        matches!(self, ToolInput::None)
    }
}

// ─────────────────────────────────────────────
// Parsed actions
// ─────────────────────────────────────────────

/// One validated action extracted from a model reply.
///
/// Constructed only by the action parser; both variants keep the raw model
/// output so the scratchpad can replay it verbatim and failures can be
/// diagnosed from logs.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedAction {
    /// The terminal action: `output` is the final answer for this turn.
    Finish { output: String, raw: String },
    /// A tool invocation to dispatch against the registry.
    Invoke {
        tool: String,
        input: ToolInput,
        raw: String,
    },
}

impl ParsedAction {
    /// The raw model output this action was parsed from.
    pub fn raw(&self) -> &str {
        match self {
            ParsedAction::Finish { raw, .. } => raw,
            ParsedAction::Invoke { raw, .. } => raw,
        }
    }

    /// The invoked tool name, if this is an `Invoke`.
    pub fn tool(&self) -> Option<&str> {
        match self {
            ParsedAction::Invoke { tool, .. } => Some(tool),
            ParsedAction::Finish { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────
// Turn results
// ─────────────────────────────────────────────

/// One tool invocation and its observation, recorded within a turn.
///
/// The scratchpad grows by one entry per dispatch cycle and is discarded at
/// the end of the turn; only the final answer goes back into history.
#[derive(Clone, Debug)]
pub struct ScratchpadEntry {
    /// The dispatched action (always the `Invoke` variant).
    pub action: ParsedAction,
    /// The text the tool returned.
    pub observation: String,
}

/// Why a turn stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishReason {
    /// The model emitted the terminal action.
    Finished,
    /// The iteration bound was reached before a terminal action.
    IterationLimit,
}

/// The outcome of one user turn.
///
/// Ownership passes to the caller, which decides what to persist. A turn
/// that ran out of iterations is still a result, not an error — `reason`
/// distinguishes it and `steps` carries the partial progress.
#[derive(Clone, Debug)]
pub struct TurnResult {
    /// The assistant's final answer for this turn.
    pub output: String,
    /// Tool invocations made along the way, in dispatch order.
    pub steps: Vec<ScratchpadEntry>,
    /// Whether the turn completed normally.
    pub reason: FinishReason,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

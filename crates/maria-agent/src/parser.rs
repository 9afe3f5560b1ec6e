//! Action parser — turns raw model output into exactly one [`ParsedAction`].
//!
//! The model is instructed to answer with a single JSON blob inside a
//! markdown code fence:
//!
//! ```json
//! {"tool": "welcome_email_tool", "tool_input": "ana@x.com"}
//! ```
//!
//! The parser tolerates a missing fence (bare JSON) and an array of actions
//! (some models ignore the single-action directive; the first element wins
//! and the truncation is logged and counted, never silent). Everything else
//! is a parse failure carrying the offending text.

use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use maria_core::types::{ParsedAction, ToolInput};

use crate::error::TurnError;

/// Parses model replies against a fixed terminal tool name.
pub struct ActionParser {
    /// Tool name that signals loop termination instead of a dispatch.
    terminal_tool: String,
    /// Fenced-code-block extractor.
    fence: Regex,
    /// How many replies carried more than one action.
    multi_action_count: AtomicU64,
}

impl std::fmt::Debug for ActionParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionParser")
            .field("terminal_tool", &self.terminal_tool)
            .finish()
    }
}

impl ActionParser {
    /// Create a parser with the given terminal tool name.
    pub fn new(terminal_tool: impl Into<String>) -> Self {
        ActionParser {
            terminal_tool: terminal_tool.into(),
            fence: Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```")
                .expect("fence regex is statically valid"),
            multi_action_count: AtomicU64::new(0),
        }
    }

    /// The configured terminal tool name.
    pub fn terminal_tool(&self) -> &str {
        &self.terminal_tool
    }

    /// How many parsed replies carried a multi-action array (truncated to
    /// their first element).
    pub fn multi_action_count(&self) -> u64 {
        self.multi_action_count.load(Ordering::Relaxed)
    }

    /// Parse one model reply into an action.
    pub fn parse(&self, text: &str) -> Result<ParsedAction, TurnError> {
        let value = self.extract_json(text).map_err(|reason| TurnError::Parse {
            raw: text.to_string(),
            reason,
        })?;

        let value = match value {
            Value::Array(items) => {
                // The single-action directive is sometimes ignored; keep the
                // first action, drop the rest, make the anomaly observable.
                warn!(
                    actions = items.len(),
                    "model emitted multiple actions, keeping the first"
                );
                self.multi_action_count.fetch_add(1, Ordering::Relaxed);
                items.into_iter().next().ok_or_else(|| TurnError::Parse {
                    raw: text.to_string(),
                    reason: "action array is empty".to_string(),
                })?
            }
            other => other,
        };

        let object = value.as_object().ok_or_else(|| TurnError::Parse {
            raw: text.to_string(),
            reason: "top-level JSON value is not an object".to_string(),
        })?;

        let tool = object
            .get("tool")
            .and_then(Value::as_str)
            .ok_or_else(|| TurnError::Parse {
                raw: text.to_string(),
                reason: "missing string \"tool\" key".to_string(),
            })?;

        let input = match object.get("tool_input") {
            None | Some(Value::Null) => ToolInput::None,
            Some(Value::String(s)) => ToolInput::Text(s.clone()),
            Some(v) => ToolInput::Json(v.clone()),
        };

        if tool == self.terminal_tool {
            Ok(ParsedAction::Finish {
                output: input.to_text(),
                raw: text.to_string(),
            })
        } else {
            Ok(ParsedAction::Invoke {
                tool: tool.to_string(),
                input,
                raw: text.to_string(),
            })
        }
    }

    /// Extract a JSON value from `text`: fenced code block first, then the
    /// whole trimmed text.
    fn extract_json(&self, text: &str) -> Result<Value, String> {
        if let Some(captures) = self.fence.captures(text) {
            let inner = captures
                .get(1)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .trim();
            return serde_json::from_str(inner).map_err(|e| e.to_string());
        }
        serde_json::from_str(text.trim()).map_err(|e| e.to_string())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parser() -> ActionParser {
        ActionParser::new("respond_tool")
    }

    #[test]
    fn fenced_invoke_action() {
        let text = "```json\n{\"tool\": \"welcome_email_tool\", \"tool_input\": \"ana@x.com\"}\n```";
        let action = parser().parse(text).unwrap();

        match action {
            ParsedAction::Invoke { tool, input, raw } => {
                assert_eq!(tool, "welcome_email_tool");
                assert_eq!(input, ToolInput::Text("ana@x.com".into()));
                assert_eq!(raw, text);
            }
            other => panic!("expected Invoke, got {other:?}"),
        }
    }

    #[test]
    fn fence_without_language_tag() {
        let text = "```\n{\"tool\": \"HR_policy_QA_tool\", \"tool_input\": \"holiday policy?\"}\n```";
        let action = parser().parse(text).unwrap();
        assert_eq!(action.tool(), Some("HR_policy_QA_tool"));
    }

    #[test]
    fn bare_json_without_fence() {
        let text = r#"{"tool": "view_time_off_requests_tool", "tool_input": "215"}"#;
        let action = parser().parse(text).unwrap();
        assert_eq!(action.tool(), Some("view_time_off_requests_tool"));
    }

    #[test]
    fn fenced_json_with_surrounding_prose() {
        let text = "Sure, let me do that.\n```json\n{\"tool\": \"slack_invite_tool\", \"tool_input\": \"ana@x.com\"}\n```\nDone.";
        let action = parser().parse(text).unwrap();
        assert_eq!(action.tool(), Some("slack_invite_tool"));
    }

    #[test]
    fn structured_tool_input_preserved() {
        let text = "```json\n{\"tool\": \"add_employee_to_hr_tool\", \"tool_input\": {\"first_name\": \"Ana\", \"last_name\": \"Lee\", \"email_address\": \"ana@x.com\"}}\n```";
        let action = parser().parse(text).unwrap();

        match action {
            ParsedAction::Invoke { input, .. } => match input {
                ToolInput::Json(value) => {
                    assert_eq!(value["first_name"], "Ana");
                    assert_eq!(value["email_address"], "ana@x.com");
                }
                other => panic!("expected Json input, got {other:?}"),
            },
            other => panic!("expected Invoke, got {other:?}"),
        }
    }

    #[test]
    fn terminal_tool_finishes() {
        let text = "```json\n{\"tool\": \"respond_tool\", \"tool_input\": \"Welcome aboard, Ana!\"}\n```";
        let action = parser().parse(text).unwrap();

        match action {
            ParsedAction::Finish { output, raw } => {
                assert_eq!(output, "Welcome aboard, Ana!");
                assert_eq!(raw, text);
            }
            other => panic!("expected Finish, got {other:?}"),
        }
    }

    #[test]
    fn terminal_tool_without_input_is_empty_output() {
        let text = r#"{"tool": "respond_tool"}"#;
        let action = parser().parse(text).unwrap();
        match action {
            ParsedAction::Finish { output, .. } => assert_eq!(output, ""),
            other => panic!("expected Finish, got {other:?}"),
        }
    }

    #[test]
    fn missing_tool_input_defaults_to_none() {
        let text = r#"{"tool": "estimate_time_off_balance_tool"}"#;
        let action = parser().parse(text).unwrap();
        match action {
            ParsedAction::Invoke { input, .. } => assert!(input.is_none()),
            other => panic!("expected Invoke, got {other:?}"),
        }
    }

    #[test]
    fn array_truncates_to_first_and_counts() {
        let p = parser();
        let payload = json!([
            {"tool": "welcome_email_tool", "tool_input": "ana@x.com"},
            {"tool": "slack_invite_tool", "tool_input": "ana@x.com"}
        ]);
        let text = format!("```json\n{payload}\n```");

        let action = p.parse(&text).unwrap();
        assert_eq!(action.tool(), Some("welcome_email_tool"));
        assert_eq!(p.multi_action_count(), 1);

        // Counter accumulates across parses
        p.parse(&text).unwrap();
        assert_eq!(p.multi_action_count(), 2);
    }

    #[test]
    fn empty_array_is_parse_error() {
        let err = parser().parse("```json\n[]\n```").unwrap_err();
        assert!(matches!(err, TurnError::Parse { .. }));
    }

    #[test]
    fn garbage_is_parse_error_with_raw_text() {
        let text = "I think I should send an email first.";
        let err = parser().parse(text).unwrap_err();

        match err {
            TurnError::Parse { ref raw, .. } => assert_eq!(raw, text),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn non_object_json_is_parse_error() {
        let err = parser().parse("\"just a string\"").unwrap_err();
        assert!(matches!(err, TurnError::Parse { .. }));
    }

    #[test]
    fn missing_tool_key_is_parse_error() {
        let err = parser()
            .parse(r#"{"tool_input": "ana@x.com"}"#)
            .unwrap_err();
        match err {
            TurnError::Parse { reason, .. } => assert!(reason.contains("tool")),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn non_string_tool_key_is_parse_error() {
        let err = parser().parse(r#"{"tool": 42}"#).unwrap_err();
        assert!(matches!(err, TurnError::Parse { .. }));
    }

    #[test]
    fn raw_output_accessor_on_error() {
        let err = parser().parse("not json").unwrap_err();
        assert_eq!(err.raw_output(), Some("not json"));
    }
}

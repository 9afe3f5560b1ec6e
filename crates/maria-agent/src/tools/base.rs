//! Tool trait — the contract every agent tool implements.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Every agent tool implements this trait.
///
/// The registry advertises tools to the model via `name()`/`description()`
/// and dispatches parsed actions via `execute()`.
///
/// `execute` receives the action's `tool_input` as text (structured inputs
/// arrive as compact JSON) and returns a human-readable observation. Tools
/// must swallow malformed-input problems and return an explanatory string
/// instead of erroring, so the loop stays alive; only genuinely unexpected
/// failures should return `Err`, which terminates the turn.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call this tool.
    fn name(&self) -> &str;

    /// Description shown to the model in the tool catalogue.
    fn description(&self) -> &str;

    /// Execute the tool and return the observation text.
    async fn execute(&self, input: &str) -> anyhow::Result<String>;
}

/// Decode a structured tool input, mapping malformed JSON to the
/// observation text a tool should return instead of failing.
///
/// ```ignore
/// let request: AddEmployeeRequest = match parse_json_input(input) {
///     Ok(request) => request,
///     Err(observation) => return Ok(observation),
/// };
/// ```
pub fn parse_json_input<T: DeserializeOwned>(input: &str) -> Result<T, String> {
    serde_json::from_str(input).map_err(|_| "The input is not valid JSON".to_string())
}

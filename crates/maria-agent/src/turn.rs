//! Turn loop — drives one user turn from input to final answer.
//!
//! State machine per turn:
//!
//! ```text
//! Start → AwaitingAction → (Dispatching → AwaitingAction)* → Done
//! ```
//!
//! Every `AwaitingAction` assembles the prompt from `{history, input,
//! scratchpad}`, makes one blocking model call, and parses exactly one
//! action. `Finish` ends the turn; `Invoke` dispatches against the registry
//! and folds the observation back into the scratchpad. Everything is
//! strictly sequential — one model call, at most one dispatch, per
//! iteration.
//!
//! The dispatch count is bounded: at the bound the loop still makes one
//! final model call (which may legitimately finish), but a further `Invoke`
//! ends the turn with [`FinishReason::IterationLimit`] and the scratchpad as
//! partial result rather than dispatching again. A cooperative cancellation
//! token is checked at the top of every iteration so a long tool-call chain
//! can be aborted between steps.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use maria_core::types::{FinishReason, Message, ParsedAction, ScratchpadEntry, TurnResult};
use maria_providers::ChatModel;

use crate::error::TurnError;
use crate::parser::ActionParser;
use crate::prompt::PromptAssembler;
use crate::tools::ToolRegistry;

/// Default maximum dispatch cycles per turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Stop sequence cutting the model off before it hallucinates observations.
const STOP_SEQUENCES: &[&str] = &["\nObservation"];

/// Final answer when the iteration budget runs out.
const ITERATION_LIMIT_OUTPUT: &str =
    "I couldn't finish that request within the allowed number of steps. \
     Here's where I got to — could you rephrase or break the request up?";

/// The agent turn loop.
///
/// One instance serves a session; it is stateless across turns apart from
/// its collaborators, so `run_turn` can be called once per user message with
/// the caller-owned history.
pub struct TurnLoop {
    /// The model boundary.
    model: Arc<dyn ChatModel>,
    /// Registered tools; immutable for the loop's lifetime.
    tools: ToolRegistry,
    /// Parses model replies into actions.
    parser: ActionParser,
    /// Renders the per-call message sequence.
    prompt: PromptAssembler,
    /// Maximum dispatch cycles per turn.
    max_iterations: usize,
}

impl TurnLoop {
    /// Create a turn loop over a tool registry.
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        parser: ActionParser,
        prompt: PromptAssembler,
        max_iterations: Option<usize>,
    ) -> Self {
        let max_iterations = max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        info!(
            tools = tools.len(),
            max_iterations = max_iterations,
            terminal = parser.terminal_tool(),
            "turn loop initialized"
        );
        TurnLoop {
            model,
            tools,
            parser,
            prompt,
            max_iterations,
        }
    }

    /// Run one user turn.
    ///
    /// `history` is the prior conversation (caller-owned, append-only);
    /// `user_input` the new message; `cancellation` is checked between
    /// iterations, so cancelling aborts after the step in flight. Returns
    /// the final answer plus the intermediate tool steps, or a turn-level
    /// failure.
    pub async fn run_turn(
        &self,
        user_input: &str,
        history: &[Message],
        cancellation: &CancellationToken,
    ) -> Result<TurnResult, TurnError> {
        let stop: Vec<String> = STOP_SEQUENCES.iter().map(|s| s.to_string()).collect();
        let mut scratchpad: Vec<ScratchpadEntry> = Vec::new();

        loop {
            if cancellation.is_cancelled() {
                info!(steps = scratchpad.len(), "turn cancelled");
                return Err(TurnError::Cancelled);
            }

            // AwaitingAction: one model call, one parsed action.
            let messages = self.prompt.assemble(history, user_input, &scratchpad);
            debug!(
                iteration = scratchpad.len(),
                messages = messages.len(),
                "awaiting action"
            );
            let reply = self.model.complete(&messages, &stop).await?;
            let action = self.parser.parse(&reply)?;

            match action {
                ParsedAction::Finish { output, .. } => {
                    info!(steps = scratchpad.len(), "turn finished");
                    return Ok(TurnResult {
                        output,
                        steps: scratchpad,
                        reason: FinishReason::Finished,
                    });
                }
                action @ ParsedAction::Invoke { .. } => {
                    if scratchpad.len() >= self.max_iterations {
                        warn!(
                            max_iterations = self.max_iterations,
                            "iteration bound reached, stopping before another dispatch"
                        );
                        return Ok(TurnResult {
                            output: ITERATION_LIMIT_OUTPUT.to_string(),
                            steps: scratchpad,
                            reason: FinishReason::IterationLimit,
                        });
                    }

                    // Dispatching: one tool call, observation into the pad.
                    let (tool, input) = match &action {
                        ParsedAction::Invoke { tool, input, .. } => (tool.clone(), input.clone()),
                        ParsedAction::Finish { .. } => unreachable!("matched Invoke above"),
                    };
                    let observation = self.tools.dispatch(&tool, &input).await?;
                    scratchpad.push(ScratchpadEntry {
                        action,
                        observation,
                    });
                }
            }
        }
    }

    /// The tool registry (for inspection and tests).
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// How many model replies carried multiple actions so far.
    pub fn multi_action_count(&self) -> u64 {
        self.parser.multi_action_count()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use maria_providers::LlmError;
    use std::sync::Mutex;

    use crate::tools::Tool;
    use crate::TERMINAL_TOOL;

    /// Model returning canned replies in sequence.
    struct ScriptedModel {
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            _messages: &[Message],
            _stop: &[String],
        ) -> Result<String, LlmError> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Ok(finish_reply("(no more scripted replies)"))
            } else {
                Ok(replies.remove(0))
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn invoke_reply(tool: &str, input: &str) -> String {
        format!("```json\n{{\"tool\": \"{tool}\", \"tool_input\": {input}}}\n```")
    }

    fn finish_reply(output: &str) -> String {
        format!("```json\n{{\"tool\": \"{TERMINAL_TOOL}\", \"tool_input\": \"{output}\"}}\n```")
    }

    /// Pretend HR enrollment tool: decodes the employee JSON and reports a
    /// fixed employee id.
    struct FakeEnrollTool;

    #[async_trait]
    impl Tool for FakeEnrollTool {
        fn name(&self) -> &str {
            "add_employee_to_hr_tool"
        }
        fn description(&self) -> &str {
            "adds a new employee to the HR system"
        }
        async fn execute(&self, input: &str) -> anyhow::Result<String> {
            let employee: serde_json::Value = match serde_json::from_str(input) {
                Ok(value) => value,
                Err(_) => return Ok("The input is not valid JSON".to_string()),
            };
            Ok(format!(
                "Employee {} {} has been added to the HR system with employee_id 215",
                employee["first_name"].as_str().unwrap_or("?"),
                employee["last_name"].as_str().unwrap_or("?"),
            ))
        }
    }

    /// Counting echo tool for iteration tests.
    struct CountingTool {
        calls: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "counting_tool"
        }
        fn description(&self) -> &str {
            "counts invocations"
        }
        async fn execute(&self, _input: &str) -> anyhow::Result<String> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Ok(format!("call #{calls}"))
        }
    }

    fn make_loop(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        max_iterations: Option<usize>,
    ) -> TurnLoop {
        let parser = ActionParser::new(TERMINAL_TOOL);
        let prompt = PromptAssembler::new("Maria", &tools);
        TurnLoop::new(model, tools, parser, prompt, max_iterations)
    }

    #[tokio::test]
    async fn immediate_finish() {
        let model = ScriptedModel::new(vec![&finish_reply("Hello! How can I help?")]);
        let agent = make_loop(model, ToolRegistry::new(), None);

        let result = agent.run_turn("Hi", &[], &CancellationToken::new()).await.unwrap();
        assert_eq!(result.output, "Hello! How can I help?");
        assert!(result.steps.is_empty());
        assert_eq!(result.reason, FinishReason::Finished);
    }

    #[tokio::test]
    async fn enrollment_scenario() {
        // history=[], input with name+email → enroll dispatch → observation
        // with the generated id → Finish referencing it.
        let model = ScriptedModel::new(vec![
            &invoke_reply(
                "add_employee_to_hr_tool",
                r#"{"first_name": "Ana", "last_name": "Lee", "email_address": "ana@x.com"}"#,
            ),
            &finish_reply("You're enrolled! Your employee id is 215."),
        ]);

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FakeEnrollTool));
        let agent = make_loop(model, tools, None);

        let result = agent
            .run_turn(
                "My name is Ana Lee, email ana@x.com",
                &[],
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].action.tool(), Some("add_employee_to_hr_tool"));
        assert!(result.steps[0].observation.contains("employee_id 215"));
        assert!(result.output.contains("215"));
        assert_eq!(result.reason, FinishReason::Finished);
    }

    #[tokio::test]
    async fn malformed_tool_input_keeps_loop_alive() {
        let model = ScriptedModel::new(vec![
            &invoke_reply("add_employee_to_hr_tool", "\"{not json\""),
            &finish_reply("Sorry, I need your details again."),
        ]);

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FakeEnrollTool));
        let agent = make_loop(model, tools, None);

        let result = agent.run_turn("enroll me", &[], &CancellationToken::new()).await.unwrap();
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].observation, "The input is not valid JSON");
        assert_eq!(result.reason, FinishReason::Finished);
    }

    #[tokio::test]
    async fn scratchpad_grows_one_entry_per_dispatch() {
        let model = ScriptedModel::new(vec![
            &invoke_reply("counting_tool", "\"a\""),
            &invoke_reply("counting_tool", "\"b\""),
            &invoke_reply("counting_tool", "\"c\""),
            &finish_reply("done"),
        ]);

        let calls = Arc::new(Mutex::new(0));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CountingTool {
            calls: calls.clone(),
        }));
        let agent = make_loop(model, tools, None);

        let result = agent.run_turn("count", &[], &CancellationToken::new()).await.unwrap();
        assert_eq!(result.steps.len(), 3);
        assert_eq!(*calls.lock().unwrap(), 3);
        for step in &result.steps {
            assert_eq!(step.action.tool(), Some("counting_tool"));
        }
    }

    #[tokio::test]
    async fn iteration_bound_allows_final_finish() {
        // Two dispatches allowed; the call made at the bound still counts if
        // it finishes.
        let model = ScriptedModel::new(vec![
            &invoke_reply("counting_tool", "\"a\""),
            &invoke_reply("counting_tool", "\"b\""),
            &finish_reply("made it"),
        ]);

        let calls = Arc::new(Mutex::new(0));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CountingTool {
            calls: calls.clone(),
        }));
        let agent = make_loop(model, tools, Some(2));

        let result = agent.run_turn("count", &[], &CancellationToken::new()).await.unwrap();
        assert_eq!(result.output, "made it");
        assert_eq!(result.reason, FinishReason::Finished);
        assert_eq!(result.steps.len(), 2);
    }

    #[tokio::test]
    async fn iteration_bound_stops_before_extra_dispatch() {
        // The model never finishes; after the bound the turn ends with the
        // partial scratchpad and no further tool call.
        let invoke = invoke_reply("counting_tool", "\"again\"");
        let model = ScriptedModel::new(vec![&invoke, &invoke, &invoke, &invoke, &invoke]);

        let calls = Arc::new(Mutex::new(0));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CountingTool {
            calls: calls.clone(),
        }));
        let agent = make_loop(model, tools, Some(3));

        let result = agent.run_turn("loop forever", &[], &CancellationToken::new()).await.unwrap();
        assert_eq!(result.reason, FinishReason::IterationLimit);
        assert_eq!(result.steps.len(), 3);
        assert_eq!(*calls.lock().unwrap(), 3);
        assert!(result.output.contains("allowed number of steps"));
    }

    #[tokio::test]
    async fn parse_error_surfaces_with_raw_text() {
        let model = ScriptedModel::new(vec!["I will now send the email."]);
        let agent = make_loop(model, ToolRegistry::new(), None);

        let err = agent.run_turn("send it", &[], &CancellationToken::new()).await.unwrap_err();
        match err {
            TurnError::Parse { raw, .. } => assert_eq!(raw, "I will now send the email."),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_surfaces() {
        let model = ScriptedModel::new(vec![&invoke_reply("no_such_tool", "\"x\"")]);
        let agent = make_loop(model, ToolRegistry::new(), None);

        let err = agent.run_turn("do it", &[], &CancellationToken::new()).await.unwrap_err();
        match err {
            TurnError::UnknownTool { name } => assert_eq!(name, "no_such_tool"),
            other => panic!("expected UnknownTool, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_aborts_between_iterations() {
        let token = CancellationToken::new();
        token.cancel();

        let model = ScriptedModel::new(vec![&finish_reply("never reached")]);
        let agent = make_loop(model, ToolRegistry::new(), None);

        let err = agent.run_turn("hi", &[], &token).await.unwrap_err();
        assert!(matches!(err, TurnError::Cancelled));
    }

    #[tokio::test]
    async fn multi_action_reply_is_truncated_and_counted() {
        let reply = "```json\n[{\"tool\": \"counting_tool\", \"tool_input\": \"a\"}, \
                     {\"tool\": \"counting_tool\", \"tool_input\": \"b\"}]\n```";
        let model = ScriptedModel::new(vec![reply, &finish_reply("done")]);

        let calls = Arc::new(Mutex::new(0));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CountingTool {
            calls: calls.clone(),
        }));
        let agent = make_loop(model, tools, None);

        let result = agent.run_turn("go", &[], &CancellationToken::new()).await.unwrap();
        // Only the first action of the array was dispatched
        assert_eq!(result.steps.len(), 1);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(agent.multi_action_count(), 1);
    }
}

//! Prompt assembler — renders the message sequence for each model call.
//!
//! Layout of one request:
//! 1. System instruction: persona, current date, the tool catalogue
//!    (`name: description` per line, registry order), and the single-JSON-
//!    action format directive.
//! 2. Prior chat history, verbatim.
//! 3. The current user input.
//! 4. For each scratchpad entry: the raw action text as an assistant
//!    message, then a "TOOL RESPONSE" user message wrapping the observation
//!    and re-stating the format directive.
//!
//! Pure transformation, no side effects. Malformed history passes through
//! unchanged — that contract belongs to the caller.

use maria_core::types::{Message, ScratchpadEntry};
use maria_core::utils::today_date;

use crate::tools::ToolRegistry;

/// Wrapper around each observation fed back to the model.
///
/// Reminds the model that tool output must never be surfaced with tool names
/// attached, and that the next reply must again be a single JSON action.
const TOOL_RESPONSE_TEMPLATE: &str = "TOOL RESPONSE:
---------------------
{observation}

USER'S INPUT
--------------------

Okay, so what is the response to my last comment? If using information obtained from the tools you must mention it explicitly without mentioning the tool names - I have forgotten all TOOL RESPONSES! Remember to respond with a markdown code snippet of a json blob with a single action, and NOTHING else - even if you just want to respond to the user. Do NOT respond with anything except a JSON snippet no matter what!";

/// Builds the LLM-facing message list for the turn loop.
pub struct PromptAssembler {
    assistant_name: String,
    /// Newline-joined `name: description` lines, registry order.
    tool_strings: String,
    /// Comma-joined tool names.
    tool_names: String,
}

impl PromptAssembler {
    /// Create an assembler bound to a tool registry's catalogue.
    ///
    /// The terminal tool leads the catalogue: it is parser-resolved rather
    /// than registered, but the model still has to know its name.
    pub fn new(assistant_name: impl Into<String>, registry: &ToolRegistry) -> Self {
        let mut tool_strings = format!(
            "{}: {}",
            crate::TERMINAL_TOOL,
            crate::TERMINAL_TOOL_DESCRIPTION
        );
        if !registry.is_empty() {
            tool_strings.push('\n');
            tool_strings.push_str(&registry.tool_strings());
        }

        let mut tool_names = vec![crate::TERMINAL_TOOL.to_string()];
        tool_names.extend(registry.tool_names());

        PromptAssembler {
            assistant_name: assistant_name.into(),
            tool_strings,
            tool_names: tool_names.join(", "),
        }
    }

    /// Build the full message list for one model call.
    pub fn assemble(
        &self,
        history: &[Message],
        user_input: &str,
        scratchpad: &[ScratchpadEntry],
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2 + history.len() + 2 * scratchpad.len());

        messages.push(Message::system(self.system_prompt()));
        messages.extend_from_slice(history);
        messages.push(Message::user(user_input));

        for entry in scratchpad {
            messages.push(Message::assistant(entry.action.raw()));
            messages.push(Message::user(format_tool_response(&entry.observation)));
        }

        messages
    }

    /// The static system instruction, rendered with today's date and the
    /// tool catalogue.
    fn system_prompt(&self) -> String {
        format!(
            "You are {name}, a friendly HR assistant who onboards new employees: you send \
             welcome emails, share the HR policies, send Slack invites, schedule onboarding \
             events, enroll employees in the HR system, manage time off, and answer questions \
             about the company's HR policies. The current date is {date}.\n\
             \n\
             TOOLS\n\
             ------\n\
             You have access to the following tools:\n\
             \n\
             {tool_strings}\n\
             \n\
             RESPONSE FORMAT INSTRUCTIONS\n\
             ----------------------------\n\
             When responding, you must always reply with a markdown code snippet of a json \
             blob with a single action, and NOTHING else. The json blob has a \"tool\" key \
             naming one of [{tool_names}] and a \"tool_input\" key with the input to that \
             tool. To talk to the user, use the \"{terminal}\" tool with your message as the \
             input. Never mention tool names to the user.",
            name = self.assistant_name,
            date = today_date(),
            tool_strings = self.tool_strings,
            tool_names = self.tool_names,
            terminal = crate::TERMINAL_TOOL,
        )
    }
}

/// Wrap an observation in the TOOL RESPONSE template.
fn format_tool_response(observation: &str) -> String {
    TOOL_RESPONSE_TEMPLATE.replace("{observation}", observation)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use maria_core::types::{ParsedAction, Role, ToolInput};
    use std::sync::Arc;

    use crate::tools::Tool;

    struct NamedTool(&'static str, &'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            self.1
        }
        async fn execute(&self, _input: &str) -> anyhow::Result<String> {
            Ok("ok".into())
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool(
            "welcome_email_tool",
            "sends a welcome email to a new employee",
        )));
        registry.register(Arc::new(NamedTool(
            "calendar_event_tool",
            "schedules a calendar event",
        )));
        registry
    }

    fn entry(tool: &str, raw: &str, observation: &str) -> ScratchpadEntry {
        ScratchpadEntry {
            action: ParsedAction::Invoke {
                tool: tool.to_string(),
                input: ToolInput::Text("x".into()),
                raw: raw.to_string(),
            },
            observation: observation.to_string(),
        }
    }

    #[test]
    fn system_prompt_lists_tools_in_registry_order() {
        let assembler = PromptAssembler::new("Maria", &registry());
        let prompt = assembler.system_prompt();

        assert!(prompt.contains("You are Maria"));
        assert!(prompt.contains("welcome_email_tool: sends a welcome email"));
        assert!(prompt.contains("respond_tool, welcome_email_tool, calendar_event_tool"));
        // Terminal tool first, then registry order (not alphabetical)
        let terminal = prompt.find("respond_tool:").unwrap();
        let welcome = prompt.find("welcome_email_tool:").unwrap();
        let calendar = prompt.find("calendar_event_tool:").unwrap();
        assert!(terminal < welcome);
        assert!(welcome < calendar);
    }

    #[test]
    fn system_prompt_contains_current_date() {
        let assembler = PromptAssembler::new("Maria", &registry());
        assert!(assembler.system_prompt().contains(&today_date()));
    }

    #[test]
    fn assemble_orders_history_then_input() {
        let assembler = PromptAssembler::new("Maria", &registry());
        let history = vec![
            Message::assistant("Hi, I am Maria."),
            Message::user("Hello!"),
        ];

        let messages = assembler.assemble(&history, "My name is Ana Lee", &[]);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "Hi, I am Maria.");
        assert_eq!(messages[2].content, "Hello!");
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(messages[3].content, "My name is Ana Lee");
    }

    #[test]
    fn assemble_renders_scratchpad_after_input() {
        let assembler = PromptAssembler::new("Maria", &registry());
        let raw = "```json\n{\"tool\": \"welcome_email_tool\", \"tool_input\": \"ana@x.com\"}\n```";
        let scratchpad = vec![entry(
            "welcome_email_tool",
            raw,
            "A welcome email has been sent to ana@x.com",
        )];

        let messages = assembler.assemble(&[], "Send Ana a welcome email", &scratchpad);

        // system, input, raw action, tool response
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, raw);
        assert_eq!(messages[3].role, Role::User);
        assert!(messages[3].content.starts_with("TOOL RESPONSE:"));
        assert!(messages[3]
            .content
            .contains("A welcome email has been sent to ana@x.com"));
        assert!(messages[3].content.contains("single action"));
    }

    #[test]
    fn assemble_interleaves_multiple_entries() {
        let assembler = PromptAssembler::new("Maria", &registry());
        let scratchpad = vec![
            entry("welcome_email_tool", "raw-1", "obs-1"),
            entry("calendar_event_tool", "raw-2", "obs-2"),
        ];

        let messages = assembler.assemble(&[], "onboard Ana", &scratchpad);

        assert_eq!(messages.len(), 6);
        assert_eq!(messages[2].content, "raw-1");
        assert!(messages[3].content.contains("obs-1"));
        assert_eq!(messages[4].content, "raw-2");
        assert!(messages[5].content.contains("obs-2"));
    }

    #[test]
    fn malformed_history_passes_through() {
        let assembler = PromptAssembler::new("Maria", &registry());
        // A tool-role message in history is unusual but not the assembler's
        // problem.
        let history = vec![Message {
            role: Role::Tool,
            content: "stray observation".into(),
        }];
        let messages = assembler.assemble(&history, "hi", &[]);
        assert_eq!(messages[1].role, Role::Tool);
        assert_eq!(messages[1].content, "stray observation");
    }
}

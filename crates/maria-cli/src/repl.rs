//! Interactive REPL — the chat front end.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Conversation history lives in memory for the session; only the final
//! answer of each turn is appended (the scratchpad is per-turn). Onboarding
//! events are drained after every turn to update the checklist, and Ctrl-C
//! during a turn cancels it cooperatively instead of killing the process.

use std::collections::HashSet;

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use maria_agent::TurnError;
use maria_core::events::OnboardingEvent;
use maria_core::types::Message;

use crate::helpers;
use crate::Assistant;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Word cap on a single user message.
const MAX_INPUT_WORDS: usize = 500;

/// Checklist steps shown by `/status`, in display order.
const CHECKLIST: &[OnboardingEvent] = &[
    OnboardingEvent::WelcomeEmailSent,
    OnboardingEvent::PolicyEmailSent,
    OnboardingEvent::SlackInviteSent,
    OnboardingEvent::CalendarEventScheduled,
    OnboardingEvent::EmployeeEnrolled,
];

/// The assistant's opening message; also seeds the conversation history.
pub fn greeting(assistant_name: &str) -> String {
    format!(
        "Hi, I am {assistant_name}, your personal HR assistant. To get started, can you \
         please provide your first name, last name, and email address?\n\
         I will then:\n\
           1. Send you a welcome email, the HR policies and a Slack invite.\n\
           2. Schedule a calendar event for your onboarding.\n\
           3. Enroll you in the HR system.\n\
         Thanks!"
    )
}

/// Run the interactive REPL loop.
pub async fn run(mut assistant: Assistant, show_logs: bool) -> Result<()> {
    helpers::print_banner();
    helpers::print_response(&assistant.greeting);

    let mut history: Vec<Message> = vec![Message::assistant(assistant.greeting.clone())];
    let mut completed: HashSet<OnboardingEvent> = HashSet::new();
    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }
        if trimmed == "/status" {
            print_checklist(&completed);
            continue;
        }
        if trimmed.split_whitespace().count() > MAX_INPUT_WORDS {
            eprintln!(
                "{}",
                format!("Please keep your message under {MAX_INPUT_WORDS} words.").yellow()
            );
            continue;
        }

        let _ = editor.add_history_entry(&input);

        debug!(input = trimmed, "processing input");
        helpers::print_thinking();

        let result = run_cancellable_turn(&assistant, trimmed, &history).await;
        helpers::clear_thinking();

        // Status updates from tools that completed during the turn arrive
        // regardless of how the turn itself ended.
        for event in assistant.events.drain() {
            completed.insert(event);
            println!("  {} {}", "✓".green(), event.label().dimmed());
        }

        match result {
            Ok(turn) => {
                if show_logs {
                    helpers::print_steps(&turn.steps);
                }
                helpers::print_response(&turn.output);

                history.push(Message::user(trimmed));
                history.push(Message::assistant(turn.output));
            }
            Err(TurnError::Cancelled) => {
                eprintln!("{}", "\n(turn cancelled)\n".yellow());
            }
            Err(e) => {
                eprintln!("\n{} {e:#}\n", "Error:".red().bold());
            }
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// Run one turn, cancelling it cooperatively on Ctrl-C.
async fn run_cancellable_turn(
    assistant: &Assistant,
    input: &str,
    history: &[Message],
) -> Result<maria_core::types::TurnResult, TurnError> {
    let cancellation = CancellationToken::new();
    let turn = assistant.turn_loop.run_turn(input, history, &cancellation);
    tokio::pin!(turn);

    loop {
        tokio::select! {
            result = &mut turn => return result,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("{}", " cancelling after the current step...".yellow());
                cancellation.cancel();
            }
        }
    }
}

/// Print the onboarding checklist.
fn print_checklist(completed: &HashSet<OnboardingEvent>) {
    println!();
    println!("{}", "Onboarding status".bold());
    for step in CHECKLIST {
        let mark = if completed.contains(step) {
            "✓".green().to_string()
        } else {
            "·".dimmed().to_string()
        };
        println!("  {} {}", mark, step.label());
    }
    println!();
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    maria_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("/quit"));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("hello"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn greeting_mentions_the_assistant() {
        let text = greeting("Maria");
        assert!(text.contains("I am Maria"));
        assert!(text.contains("welcome email"));
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".maria"));
        assert!(path.to_string_lossy().contains("cli_history"));
    }

    #[test]
    fn checklist_covers_all_events() {
        assert_eq!(CHECKLIST.len(), 5);
    }
}

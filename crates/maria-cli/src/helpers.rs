//! Shared CLI helpers — response printing, banner, tool trace.

use colored::Colorize;

use maria_core::types::ScratchpadEntry;
use maria_core::utils::truncate_string;

/// Print an assistant response to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "Maria".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Maria".cyan().bold(), version.dimmed());
    println!(
        "{}",
        "Type a message, \"/status\" for the onboarding checklist, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print the tool trace of a turn (shown under --logs).
pub fn print_steps(steps: &[ScratchpadEntry]) {
    if steps.is_empty() {
        return;
    }
    println!();
    println!("{}", "Tool trace".dimmed().bold());
    for (i, step) in steps.iter().enumerate() {
        let tool = step.action.tool().unwrap_or("?");
        println!(
            "  {} {} → {}",
            format!("{}.", i + 1).dimmed(),
            tool.dimmed(),
            truncate_string(step.observation.trim(), 120).dimmed()
        );
    }
}

/// Print a "thinking" placeholder.
pub fn print_thinking() {
    eprint!("{}", "… thinking".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

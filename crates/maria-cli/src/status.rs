//! `maria status` — show configuration status.

use anyhow::Result;
use colored::Colorize;

use maria_core::config::load_config;
use maria_core::utils::{expand_tilde, get_data_path};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let data_dir = get_data_path();
    let config_path = data_dir.join("config.json");

    println!();
    println!("{}", "Maria Status".cyan().bold());
    println!();

    // Config file
    let config_exists = config_path.exists();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found — run `maria init`)".red().to_string()
        }
    );

    // Model
    println!("  {:<18} {}", "Model:".bold(), config.assistant.model);
    println!(
        "  {:<18} {} | max_tokens: {} | max_iterations: {}",
        "Parameters:".bold(),
        format!("temp: {}", config.assistant.temperature).dimmed(),
        format!("{}", config.assistant.max_tokens).dimmed(),
        format!("{}", config.assistant.max_iterations).dimmed(),
    );

    // Integrations
    println!();
    println!("  {}", "Integrations:".bold());
    print_configured("LLM API", config.llm.is_configured());
    print_configured("BambooHR", config.bamboo.is_configured());
    print_configured("SMTP mail", config.mail.is_configured());
    print_configured("Google Calendar", config.calendar.is_configured());
    print_configured("Slack invite URL", config.slack.is_configured());

    // Policy document
    println!();
    let policies_path = expand_tilde(&config.policies.path);
    let policies_status = if policies_path.is_file() {
        "✓".green().to_string()
    } else {
        "(not found — run `maria init`)".red().to_string()
    };
    println!(
        "  {:<18} {} {}",
        "Policies:".bold(),
        policies_path.display(),
        policies_status
    );

    println!();
    Ok(())
}

fn print_configured(name: &str, configured: bool) {
    let status = if configured {
        format!("{} (configured)", "✓".green())
    } else {
        format!("{}", "· not configured".dimmed())
    };
    println!("    {:<20} {}", name, status);
}

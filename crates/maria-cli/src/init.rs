//! `maria init` — initialize configuration and the starter policy document.
//!
//! - Creates `~/.maria/config.json` with defaults
//! - Creates `~/.maria/assets/hr_policies.md` as a starting point

use anyhow::Result;
use colored::Colorize;

use maria_core::config::{load_config, save_config};
use maria_core::utils::{get_assets_path, get_data_path};

/// Run the init command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "Maria — Setup".cyan().bold());
    println!();

    let data_dir = get_data_path();
    let config_path = data_dir.join("config.json");

    // 1. Create config if it doesn't exist
    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        let config = load_config(None); // defaults + env overrides
        save_config(&config, Some(&config_path))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    // 2. Starter policy document
    let assets_dir = get_assets_path();
    std::fs::create_dir_all(&assets_dir)?;
    let policies_path = assets_dir.join("hr_policies.md");
    if policies_path.exists() {
        println!(
            "  {} policy document already exists at {}",
            "✓".green(),
            policies_path.display()
        );
    } else {
        std::fs::write(&policies_path, POLICIES_TEMPLATE)?;
        println!(
            "  {} created policy document at {}",
            "✓".green(),
            policies_path.display()
        );
    }

    println!();
    println!(
        "{}",
        "  Setup complete! Fill in the API keys in the config, then run `maria chat`.".green()
    );
    println!();

    Ok(())
}

// ─────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────

const POLICIES_TEMPLATE: &str = r#"# HR Policies

Replace this file with your company's HR policy document. The policy QA tool
answers questions from its contents, and the HR policies email attaches it.

## Vacation

Every employee receives 25 days of paid vacation per year, accrued monthly
from the hire date. Requests are filed through the HR system and approved by
the line manager.

## Probation

The probation period lasts three months and ends with a review.

## Working hours

Standard working hours are 9:00 to 17:30, Monday to Friday, with flexible
start and end times by agreement.
"#;

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

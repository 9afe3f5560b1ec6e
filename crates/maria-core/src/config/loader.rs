//! Config loader — reads `~/.maria/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.maria/config.json`
//! 3. Environment variables `MARIA_<SECTION>__<FIELD>` (override JSON)
//!
//! A handful of conventional variable names (`OPENAI_API_KEY`,
//! `BAMBOO_HR_API_KEY`, `SLACK_INVITE_URL`) are honored as fallbacks when
//! the corresponding field is still empty after the steps above.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be
/// parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `MARIA_<SECTION>__<FIELD>` (double underscore as
/// delimiter), e.g. `MARIA_LLM__API_KEY` or `MARIA_ASSISTANT__MODEL`.
fn apply_env_overrides(mut config: Config) -> Config {
    // Assistant
    if let Ok(val) = std::env::var("MARIA_ASSISTANT__MODEL") {
        config.assistant.model = val;
    }
    if let Ok(val) = std::env::var("MARIA_ASSISTANT__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.assistant.temperature = t;
        }
    }
    if let Ok(val) = std::env::var("MARIA_ASSISTANT__MAX_TOKENS") {
        if let Ok(n) = val.parse::<u32>() {
            config.assistant.max_tokens = n;
        }
    }
    if let Ok(val) = std::env::var("MARIA_ASSISTANT__MAX_ITERATIONS") {
        if let Ok(n) = val.parse::<usize>() {
            config.assistant.max_iterations = n;
        }
    }

    // LLM endpoint
    if let Ok(val) = std::env::var("MARIA_LLM__API_KEY") {
        config.llm.api_key = val;
    }
    if let Ok(val) = std::env::var("MARIA_LLM__API_BASE") {
        config.llm.api_base = val;
    }
    if let Ok(val) = std::env::var("MARIA_LLM__EMBEDDING_MODEL") {
        config.llm.embedding_model = val;
    }

    // BambooHR
    if let Ok(val) = std::env::var("MARIA_BAMBOO__API_KEY") {
        config.bamboo.api_key = val;
    }
    if let Ok(val) = std::env::var("MARIA_BAMBOO__BASE_URL") {
        config.bamboo.base_url = val;
    }

    // Mail
    if let Ok(val) = std::env::var("MARIA_MAIL__SMTP_HOST") {
        config.mail.smtp_host = val;
    }
    if let Ok(val) = std::env::var("MARIA_MAIL__SMTP_PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.mail.smtp_port = p;
        }
    }
    if let Ok(val) = std::env::var("MARIA_MAIL__SMTP_USERNAME") {
        config.mail.smtp_username = val;
    }
    if let Ok(val) = std::env::var("MARIA_MAIL__SMTP_PASSWORD") {
        config.mail.smtp_password = val;
    }

    // Calendar
    if let Ok(val) = std::env::var("MARIA_CALENDAR__ACCESS_TOKEN") {
        config.calendar.access_token = val;
    }

    // Slack
    if let Ok(val) = std::env::var("MARIA_SLACK__INVITE_URL") {
        config.slack.invite_url = val;
    }

    // Conventional fallbacks, only when still unset
    if config.llm.api_key.is_empty() {
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            config.llm.api_key = val;
        }
    }
    if config.bamboo.api_key.is_empty() {
        if let Ok(val) = std::env::var("BAMBOO_HR_API_KEY") {
            config.bamboo.api_key = val;
        }
    }
    if config.slack.invite_url.is_empty() {
        if let Ok(val) = std::env::var("SLACK_INVITE_URL") {
            config.slack.invite_url = val;
        }
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Configuration schema — typed settings for the assistant and its
//! integrations.
//!
//! Hierarchy: `Config` → `AssistantConfig`, `LlmConfig`, `BambooConfig`,
//! `MailConfig`, `CalendarConfig`, `SlackConfig`, `PoliciesConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.maria/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub assistant: AssistantConfig,
    pub llm: LlmConfig,
    pub bamboo: BambooConfig,
    pub mail: MailConfig,
    pub calendar: CalendarConfig,
    pub slack: SlackConfig,
    pub policies: PoliciesConfig,
}

// ─────────────────────────────────────────────
// Assistant
// ─────────────────────────────────────────────

/// Settings for the agent turn loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantConfig {
    /// Display name used in the system prompt and CLI output.
    pub name: String,
    /// Chat model identifier.
    pub model: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum tokens to generate per model reply.
    pub max_tokens: u32,
    /// Maximum tool-dispatch cycles per turn before giving up.
    pub max_iterations: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "Maria".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.1,
            max_tokens: 1024,
            max_iterations: 15,
        }
    }
}

// ─────────────────────────────────────────────
// LLM provider
// ─────────────────────────────────────────────

/// OpenAI-compatible API endpoint settings (chat + embeddings).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    /// API key for Bearer authentication.
    #[serde(default)]
    pub api_key: String,
    /// API base URL.
    pub api_base: String,
    /// Embedding model used by the policy index.
    pub embedding_model: String,
}

impl LlmConfig {
    /// Whether an API key has been configured.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// BambooHR
// ─────────────────────────────────────────────

/// BambooHR API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BambooConfig {
    /// API key (sent as Basic auth `key:x`).
    #[serde(default)]
    pub api_key: String,
    /// Full API base, including the company gateway path.
    pub base_url: String,
    /// Office location recorded on new employees.
    pub default_location: String,
}

impl BambooConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl Default for BambooConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.bamboohr.com/api/gateway.php/acme/v1".to_string(),
            default_location: "London, UK".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Mail (SMTP)
// ─────────────────────────────────────────────

/// Outbound SMTP settings for the email tools.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailConfig {
    /// SMTP server hostname.
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP server port (default 587 for STARTTLS).
    pub smtp_port: u16,
    /// SMTP login username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP login password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address; falls back to smtp_username when empty.
    #[serde(default)]
    pub from_address: String,
}

impl MailConfig {
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.is_empty()
    }

    /// The effective From address.
    pub fn sender(&self) -> &str {
        if self.from_address.is_empty() {
            &self.smtp_username
        } else {
            &self.from_address
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: String::new(),
        }
    }
}

// ─────────────────────────────────────────────
// Calendar
// ─────────────────────────────────────────────

/// Google Calendar API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarConfig {
    /// REST API base.
    pub api_base: String,
    /// OAuth bearer token (obtained out of band).
    #[serde(default)]
    pub access_token: String,
    /// Calendar to schedule events on.
    pub calendar_id: String,
}

impl CalendarConfig {
    pub fn is_configured(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            access_token: String::new(),
            calendar_id: "primary".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Slack
// ─────────────────────────────────────────────

/// Slack workspace settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackConfig {
    /// Shared invite link mailed to new employees.
    #[serde(default)]
    pub invite_url: String,
}

impl SlackConfig {
    pub fn is_configured(&self) -> bool {
        !self.invite_url.is_empty()
    }
}

// ─────────────────────────────────────────────
// Policies
// ─────────────────────────────────────────────

/// Location of the HR policy document that backs the QA tool and the
/// policies email attachment.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoliciesConfig {
    /// Path to the policy document (`~` is expanded at load time by the CLI).
    pub path: String,
}

impl Default for PoliciesConfig {
    fn default() -> Self {
        Self {
            path: "~/.maria/assets/hr_policies.md".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Email tools — welcome email, HR policies email, Slack invite.
//!
//! All three take a recipient address as their input and send through the
//! shared [`Mailer`]. Each emits its onboarding event once, after the send
//! succeeded.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;

use maria_core::events::{EventSender, OnboardingEvent};
use maria_integrations::Mailer;

use super::base::Tool;

/// Minimal address sanity check; a failed send still escapes if the server
/// rejects what passed here.
fn invalid_address(input: &str) -> Option<String> {
    let address = input.trim();
    if address.is_empty() {
        return Some("The input is empty; expected the recipient's email address".to_string());
    }
    if !address.contains('@') || address.contains(char::is_whitespace) {
        return Some(format!("'{address}' is not a valid email address"));
    }
    None
}

// ─────────────────────────────────────────────
// WelcomeEmailTool
// ─────────────────────────────────────────────

/// Sends the welcome email to a new employee.
pub struct WelcomeEmailTool {
    mailer: Arc<Mailer>,
    events: Option<EventSender>,
}

impl WelcomeEmailTool {
    pub fn new(mailer: Arc<Mailer>, events: Option<EventSender>) -> Self {
        Self { mailer, events }
    }
}

#[async_trait]
impl Tool for WelcomeEmailTool {
    fn name(&self) -> &str {
        "welcome_email_tool"
    }

    fn description(&self) -> &str {
        "useful to send a welcome email to a new employee. The input to this tool is the email address of the recipient."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        if let Some(observation) = invalid_address(input) {
            return Ok(observation);
        }
        let recipient = input.trim();

        self.mailer
            .send(
                recipient,
                "Welcome to the company!",
                "Welcome to the company! We are very happy to have you here.",
                None,
            )
            .await
            .context("welcome email send failed")?;

        if let Some(ref events) = self.events {
            events.emit(OnboardingEvent::WelcomeEmailSent);
        }

        Ok(format!("\nA welcome email has been sent to {recipient}\n"))
    }
}

// ─────────────────────────────────────────────
// PolicyEmailTool
// ─────────────────────────────────────────────

/// Emails the HR policy document as an attachment.
pub struct PolicyEmailTool {
    mailer: Arc<Mailer>,
    policies_path: PathBuf,
    events: Option<EventSender>,
}

impl PolicyEmailTool {
    pub fn new(mailer: Arc<Mailer>, policies_path: PathBuf, events: Option<EventSender>) -> Self {
        Self {
            mailer,
            policies_path,
            events,
        }
    }
}

#[async_trait]
impl Tool for PolicyEmailTool {
    fn name(&self) -> &str {
        "HR_policy_email_tool"
    }

    fn description(&self) -> &str {
        "useful to send an email with the HR policies to the new employee. The only input is the email address of the recipient."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        if let Some(observation) = invalid_address(input) {
            return Ok(observation);
        }
        let recipient = input.trim();

        self.mailer
            .send(
                recipient,
                "HR policies",
                "Please find attached the HR policies of the company",
                Some(&self.policies_path),
            )
            .await
            .context("HR policies email send failed")?;

        if let Some(ref events) = self.events {
            events.emit(OnboardingEvent::PolicyEmailSent);
        }

        Ok(format!(
            "\nAn email with the HR policies has been sent to {recipient}\n"
        ))
    }
}

// ─────────────────────────────────────────────
// SlackInviteTool
// ─────────────────────────────────────────────

/// Emails a Slack workspace invite link to a new employee.
pub struct SlackInviteTool {
    mailer: Arc<Mailer>,
    invite_url: String,
    events: Option<EventSender>,
}

impl SlackInviteTool {
    pub fn new(mailer: Arc<Mailer>, invite_url: String, events: Option<EventSender>) -> Self {
        Self {
            mailer,
            invite_url,
            events,
        }
    }
}

#[async_trait]
impl Tool for SlackInviteTool {
    fn name(&self) -> &str {
        "slack_invite_tool"
    }

    fn description(&self) -> &str {
        "useful to send a Slack invite to a new employee via email. The only input is the email address of the recipient."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        if let Some(observation) = invalid_address(input) {
            return Ok(observation);
        }
        let recipient = input.trim();

        let body = format!(
            "Welcome to the company!\n\nHere is your Slack invitation:\n{}",
            self.invite_url
        );
        self.mailer
            .send(recipient, "Slack invite", &body, None)
            .await
            .context("Slack invite email send failed")?;

        if let Some(ref events) = self.events {
            events.emit(OnboardingEvent::SlackInviteSent);
        }

        Ok(format!(
            "\nAn email with a Slack invite has been sent to {recipient}\n"
        ))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

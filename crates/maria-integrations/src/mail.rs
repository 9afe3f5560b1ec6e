//! Outbound mail — SMTP sending via `lettre`.
//!
//! Plain-text bodies, with optional single-file attachments (the HR policies
//! document). STARTTLS on the configured port.

use std::path::Path;

use anyhow::{bail, Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as EmailMessage, Tokio1Executor};
use tracing::{debug, info};

use maria_core::config::schema::MailConfig;

/// SMTP mail sender.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer").field("from", &self.from).finish()
    }
}

impl Mailer {
    /// Create a mailer from config.
    pub fn new(config: &MailConfig) -> Result<Self> {
        if config.smtp_host.is_empty() {
            bail!("SMTP host not configured");
        }

        let from: Mailbox = config
            .sender()
            .parse()
            .with_context(|| format!("invalid from address '{}'", config.sender()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .context("failed to configure SMTP transport")?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Mailer { transport, from })
    }

    /// Send a plain-text email, optionally with one file attachment.
    pub async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<()> {
        let email = build_email(&self.from, recipient, subject, body, attachment)?;

        debug!(to = recipient, subject = subject, "sending email");
        self.transport
            .send(email)
            .await
            .with_context(|| format!("failed to send email to {recipient}"))?;

        info!(to = recipient, subject = subject, "email sent");
        Ok(())
    }
}

/// Build the MIME message; separated from sending for testability.
fn build_email(
    from: &Mailbox,
    recipient: &str,
    subject: &str,
    body: &str,
    attachment: Option<&Path>,
) -> Result<EmailMessage> {
    let to: Mailbox = recipient
        .parse()
        .with_context(|| format!("invalid recipient address '{recipient}'"))?;

    let builder = EmailMessage::builder()
        .from(from.clone())
        .to(to)
        .subject(subject);

    let email = match attachment {
        None => builder
            .body(body.to_string())
            .context("failed to build email")?,
        Some(path) => {
            if !path.is_file() {
                bail!("attachment {} not found", path.display());
            }
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read attachment {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string());
            let content_type = ContentType::parse(guess_content_type(&filename))
                .context("invalid attachment content type")?;

            builder
                .multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(body.to_string()))
                        .singlepart(Attachment::new(filename).body(bytes, content_type)),
                )
                .context("failed to build email with attachment")?
        }
    };

    Ok(email)
}

/// Guess a MIME type from a filename extension.
fn guess_content_type(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".md") {
        "text/markdown"
    } else if lower.ends_with(".txt") {
        "text/plain"
    } else if lower.ends_with(".html") {
        "text/html"
    } else {
        "application/octet-stream"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

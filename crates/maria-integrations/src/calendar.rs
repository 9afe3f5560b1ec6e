//! Google Calendar REST client — event scheduling.
//!
//! Thin mapper onto the Calendar v3 events API with a pre-obtained OAuth
//! bearer token. When attendees are present a Meet conference is requested
//! alongside the event.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::debug;

use maria_core::config::schema::CalendarConfig;

/// A calendar event to schedule.
#[derive(Clone, Debug)]
pub struct EventRequest {
    /// Event title.
    pub summary: String,
    /// Start time, ISO 8601.
    pub start_time: String,
    /// End time, ISO 8601.
    pub end_time: String,
    /// Attendee email addresses.
    pub attendees: Vec<String>,
    /// IANA timezone name.
    pub timezone: String,
}

/// Client for the Google Calendar v3 REST API.
pub struct CalendarClient {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
    calendar_id: String,
}

impl std::fmt::Debug for CalendarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarClient")
            .field("api_base", &self.api_base)
            .field("calendar_id", &self.calendar_id)
            .finish()
    }
}

impl CalendarClient {
    /// Create a new client from config.
    pub fn new(config: &CalendarConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(CalendarClient {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            calendar_id: config.calendar_id.clone(),
        })
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.api_base, self.calendar_id)
    }

    /// Schedule an event. Returns the created event id.
    pub async fn schedule_event(&self, event: &EventRequest) -> Result<String> {
        let mut body = json!({
            "summary": event.summary,
            "start": {
                "dateTime": event.start_time,
                "timeZone": event.timezone,
            },
            "end": {
                "dateTime": event.end_time,
                "timeZone": event.timezone,
            },
            "attendees": event.attendees.iter()
                .map(|email| json!({"email": email}))
                .collect::<Vec<_>>(),
        });

        // Attach a Meet conference when anyone is invited
        if !event.attendees.is_empty() {
            body["conferenceData"] = json!({
                "createRequest": {
                    "conferenceSolutionKey": {"type": "hangoutsMeet"},
                    "requestId": format!("maria-{}", Utc::now().timestamp_millis()),
                }
            });
        }

        let res = self
            .client
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .query(&[("conferenceDataVersion", "1")])
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            bail!("error creating calendar event: {status} — {body}");
        }

        let created: serde_json::Value = res.json().await?;
        let event_id = created["id"]
            .as_str()
            .context("event response has no id")?
            .to_string();

        debug!(event_id = %event_id, summary = %event.summary, "calendar event created");
        Ok(event_id)
    }

    /// Delete an event by id.
    pub async fn delete_event(&self, event_id: &str) -> Result<()> {
        let res = self
            .client
            .delete(format!("{}/{}", self.events_url(), event_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !res.status().is_success() {
            bail!("error deleting calendar event {event_id}: {}", res.status());
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

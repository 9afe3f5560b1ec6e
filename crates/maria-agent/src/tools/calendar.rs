//! Calendar tool — schedules the onboarding event.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use maria_core::events::{EventSender, OnboardingEvent};
use maria_integrations::{CalendarClient, EventRequest};

use super::base::{parse_json_input, Tool};

/// Structured input the model provides for an event.
#[derive(Debug, Deserialize)]
struct CalendarEventInput {
    title: String,
    start_iso_datetime: String,
    end_iso_datetime: String,
    #[serde(default)]
    attendees: Vec<String>,
    /// Defaults to UTC.
    timezone: Option<String>,
}

/// Schedules a calendar event via the calendar client.
pub struct CalendarEventTool {
    calendar: Arc<CalendarClient>,
    events: Option<EventSender>,
}

impl CalendarEventTool {
    pub fn new(calendar: Arc<CalendarClient>, events: Option<EventSender>) -> Self {
        Self { calendar, events }
    }
}

#[async_trait]
impl Tool for CalendarEventTool {
    fn name(&self) -> &str {
        "calendar_event_tool"
    }

    fn description(&self) -> &str {
        "useful to schedule a calendar event for a new employee. The input to this tool is a JSON with the following format:
    {
        title: str,
        start_iso_datetime: str,
        end_iso_datetime: str,
        attendees: list[str],
        timezone: Optional[str]  # Defaults to UTC
    }
    Make sure to confirm the details of the event with the user."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let event: CalendarEventInput = match parse_json_input(input) {
            Ok(event) => event,
            Err(_) => return Ok("The event is not a valid JSON".to_string()),
        };

        // Validate the timestamps before hitting the API
        if event.start_iso_datetime.parse::<chrono::NaiveDateTime>().is_err() {
            return Ok(format!(
                "'{}' is not a valid ISO datetime for start_iso_datetime",
                event.start_iso_datetime
            ));
        }
        if event.end_iso_datetime.parse::<chrono::NaiveDateTime>().is_err() {
            return Ok(format!(
                "'{}' is not a valid ISO datetime for end_iso_datetime",
                event.end_iso_datetime
            ));
        }

        let request = EventRequest {
            summary: event.title,
            start_time: event.start_iso_datetime,
            end_time: event.end_iso_datetime,
            attendees: event.attendees,
            timezone: event.timezone.unwrap_or_else(|| "UTC".to_string()),
        };

        let event_id = self
            .calendar
            .schedule_event(&request)
            .await
            .context("calendar event creation failed")?;

        if let Some(ref events) = self.events {
            events.emit(OnboardingEvent::CalendarEventScheduled);
        }

        Ok(format!(
            "\nA calendar event has been created with id {event_id}\n"
        ))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

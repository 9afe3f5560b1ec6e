//! Onboarding event channel — completion signals from side-effecting tools.
//!
//! The application passes an [`EventSender`] into the tools it wants status
//! updates from; each tool emits its event once, after the external effect
//! succeeded (never on failure). The receiving end drains the channel between
//! turns to update the onboarding checklist. Only one turn loop runs at a
//! time, so the channel is effectively single-writer.

use tokio::sync::mpsc;
use tracing::debug;

/// A completed onboarding step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OnboardingEvent {
    WelcomeEmailSent,
    PolicyEmailSent,
    SlackInviteSent,
    CalendarEventScheduled,
    EmployeeEnrolled,
}

impl OnboardingEvent {
    /// Human-readable label for the onboarding checklist.
    pub fn label(&self) -> &'static str {
        match self {
            OnboardingEvent::WelcomeEmailSent => "Welcome email",
            OnboardingEvent::PolicyEmailSent => "HR policies email",
            OnboardingEvent::SlackInviteSent => "Slack invite",
            OnboardingEvent::CalendarEventScheduled => "Onboarding event scheduled",
            OnboardingEvent::EmployeeEnrolled => "Enrolled in HR system",
        }
    }
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Sending half, cloned into each side-effecting tool.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<OnboardingEvent>,
}

impl EventSender {
    /// Emit a completion event.
    ///
    /// A dropped receiver is not an error — the effect already happened, the
    /// status display just isn't listening anymore.
    pub fn emit(&self, event: OnboardingEvent) {
        if self.tx.send(event).is_err() {
            debug!(?event, "no event listener, dropping onboarding event");
        }
    }
}

/// Receiving half, held by the application.
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<OnboardingEvent>,
}

impl EventReceiver {
    /// Drain all pending events without blocking.
    pub fn drain(&mut self) -> Vec<OnboardingEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

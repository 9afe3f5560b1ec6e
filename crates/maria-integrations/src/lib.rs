//! External service clients for Maria.
//!
//! Each module is a thin parameter-to-request mapper over one collaborator:
//! - [`bamboo`] — BambooHR employees + time off
//! - [`mail`] — outbound SMTP with attachments
//! - [`calendar`] — Google Calendar event scheduling
//! - [`retrieval`] — policy document similarity search

pub mod bamboo;
pub mod calendar;
pub mod mail;
pub mod retrieval;

pub use bamboo::{BambooClient, EmployeeUpdate};
pub use calendar::{CalendarClient, EventRequest};
pub use mail::Mailer;
pub use retrieval::{PolicyIndex, Retriever};

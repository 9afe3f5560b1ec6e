//! Maria core — shared types, events, config, and utilities.
//!
//! This crate holds everything the other crates agree on:
//! - **types**: messages, parsed actions, scratchpad entries, turn results
//! - **events**: the onboarding completion-event channel
//! - **config**: typed configuration schema + loader
//! - **utils**: path and date helpers

pub mod config;
pub mod events;
pub mod types;
pub mod utils;

pub use events::{EventReceiver, EventSender, OnboardingEvent};
pub use types::{
    FinishReason, Message, ParsedAction, Role, ScratchpadEntry, ToolInput, TurnResult,
};

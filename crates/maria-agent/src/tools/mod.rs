//! Tool modules for the Maria agent.

pub mod base;
pub mod calendar;
pub mod email;
pub mod hr;
pub mod policy;
pub mod registry;

pub use base::{parse_json_input, Tool};
pub use registry::ToolRegistry;

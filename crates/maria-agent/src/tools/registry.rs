//! Tool registry — ordered store and dispatch point for agent tools.
//!
//! Registration order is meaningful: the prompt assembler lists tools in the
//! order they were registered, so the catalogue the model sees is stable.
//! The registry is immutable for the lifetime of a turn loop.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use maria_core::types::ToolInput;

use super::base::Tool;
use crate::error::TurnError;

/// Stores tools keyed by name, preserving registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ToolRegistry {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. A tool with the same name replaces the previous one
    /// in place, keeping its position in the catalogue.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&position) => {
                warn!(tool = %name, "replacing previously registered tool");
                self.tools[position] = tool;
            }
            None => {
                info!(tool = %name, "registered tool");
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    /// Check if a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names of all registered tools, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Newline-joined `name: description` lines, in registration order.
    pub fn tool_strings(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Dispatch one parsed action to its tool.
    ///
    /// An unknown name or an escaped tool failure terminates the turn; tools
    /// handle their own recoverable problems by returning observation text.
    pub async fn dispatch(&self, name: &str, input: &ToolInput) -> Result<String, TurnError> {
        let tool = self.get(name).ok_or_else(|| {
            warn!(tool = %name, "model requested unregistered tool");
            TurnError::UnknownTool {
                name: name.to_string(),
            }
        })?;

        let input_text = input.to_text();
        debug!(tool = %name, input_len = input_text.len(), "dispatching tool");

        match tool.execute(&input_text).await {
            Ok(observation) => {
                debug!(tool = %name, observation_len = observation.len(), "tool returned");
                Ok(observation)
            }
            Err(source) => {
                warn!(tool = %name, error = %source, "tool execution failed");
                Err(TurnError::Tool {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

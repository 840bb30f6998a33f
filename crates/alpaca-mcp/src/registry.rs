//! Tool registry and dispatch
//!
//! The registry is built once at startup and is read-only afterwards.
//! [`ToolRegistry::call`] is the single path from a tool name and raw
//! arguments to a [`ToolResult`].

use std::collections::HashMap;

use serde_json::Value;

use crate::schema::validate;
use crate::tools::{ToolContext, ToolDefinition, ToolResult, get_tool_definitions};
use crate::{Error, Result};

/// Name-indexed set of tool definitions
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full Alpaca tool catalog
    pub fn alpaca() -> Result<Self> {
        let mut registry = Self::new();
        for definition in get_tool_definitions() {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Add a tool; names must be unique
    pub fn register(&mut self, definition: ToolDefinition) -> Result<()> {
        if self.index.contains_key(definition.name) {
            return Err(Error::DuplicateTool(definition.name.to_string()));
        }
        self.index.insert(definition.name, self.tools.len());
        self.tools.push(definition);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDefinition> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up, validate and run a tool.
    ///
    /// Unknown tools and invalid arguments are errors, and no remote call is
    /// made for them. Failures raised by the handler become an error-shaped
    /// [`ToolResult`].
    pub async fn call(&self, ctx: &ToolContext, name: &str, arguments: &Value) -> Result<ToolResult> {
        let tool = self.lookup(name)?;

        let args = validate(&tool.schema, arguments).map_err(|err| {
            tracing::warn!(tool = name, %err, "Rejected tool arguments");
            Error::Validation(err)
        })?;

        tracing::info!(tool = name, "Calling tool");
        match (tool.handler)(ctx, args).await {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "Tool failed");
                Ok(ToolResult::error(err.to_string()))
            }
        }
    }
}

//! Result shaping shared by all handlers
//!
//! Every tool answers with a single text block: an optional summary line, a
//! blank line, then the pretty-printed remote response.

use serde_json::{Map, Value};

use crate::schema::ValidatedArgs;
use crate::tools::ToolResult;

/// Normalize a remote response into a sequence.
///
/// Arrays pass through; any other value, `null` included, becomes a
/// one-element sequence.
pub fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Pretty-printed JSON dump
pub fn dump(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// The entity itself, no summary
pub fn entity(value: &Value) -> ToolResult {
    ToolResult::text(dump(value))
}

pub fn with_summary(summary: impl AsRef<str>, value: &Value) -> ToolResult {
    ToolResult::text(format!("{}\n\n{}", summary.as_ref(), dump(value)))
}

/// Normalize `value` to a sequence and summarize it by its length
pub fn counted(value: Value, summary: impl FnOnce(usize) -> String) -> ToolResult {
    let items = into_sequence(value);
    let line = summary(items.len());
    with_summary(line, &Value::Array(items))
}

/// Render a scalar for a summary line; strings lose their quotes
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The first non-null field of `value` among `keys`
pub fn first_present<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find(|v| !v.is_null())
}

/// Outgoing request fields, built from validated arguments.
///
/// Optional arguments that were not supplied never appear in the payload.
#[derive(Debug)]
pub struct Payload<'a> {
    args: &'a ValidatedArgs,
    fields: Map<String, Value>,
}

impl<'a> Payload<'a> {
    pub fn from_args(args: &'a ValidatedArgs) -> Self {
        Self {
            args,
            fields: Map::new(),
        }
    }

    /// Copy a required argument
    pub fn field(mut self, name: &str) -> crate::Result<Self> {
        let value = self.args.value(name)?.clone();
        self.fields.insert(name.to_string(), value);
        Ok(self)
    }

    /// Copy an argument if it was supplied
    pub fn optional(self, name: &str) -> Self {
        self.optional_if(name, true)
    }

    /// Copy an argument if it was supplied and `condition` holds
    pub fn optional_if(mut self, name: &str, condition: bool) -> Self {
        if condition {
            if let Some(value) = self.args.get(name) {
                self.fields.insert(name.to_string(), value.clone());
            }
        }
        self
    }

    /// Set a field to a computed value
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> Map<String, Value> {
        self.fields
    }
}

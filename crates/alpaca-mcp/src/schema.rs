//! Declarative tool schemas and argument validation
//!
//! Every tool declares its parameters as a `'static` slice of [`ParamSpec`].
//! One routine, [`validate`], interprets those declarations against the raw
//! argument bag of a `tools/call` request. The same declarations render the
//! JSON Schema advertised by `tools/list`.
//!
//! Validation is strict about shape: required fields must be present, values
//! must have the declared type, enum values must belong to the declared set,
//! bounded integers must be integral and in range, and keys that the schema
//! does not declare are rejected. Every failing field is reported, not just
//! the first one.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{Error, Result};

/// Semantic type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    /// Whole number within an inclusive range
    Integer { min: i64, max: i64 },
    Boolean,
    /// String restricted to a closed set
    Enum(&'static [&'static str]),
    StringArray,
}

/// One declared tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }

    fn json_schema(&self) -> Value {
        let mut schema = match self.kind {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Number => json!({ "type": "number" }),
            ParamKind::Integer { min, max } => {
                json!({ "type": "integer", "minimum": min, "maximum": max })
            }
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::Enum(options) => json!({ "type": "string", "enum": options }),
            ParamKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        };
        schema["description"] = Value::String(self.description.to_string());
        schema
    }

    /// Check a present, non-null value against this parameter's kind.
    ///
    /// Integers are normalized so that `5.0` is forwarded as `5`.
    fn check(&self, value: &Value) -> std::result::Result<Value, String> {
        match self.kind {
            ParamKind::String => value
                .is_string()
                .then(|| value.clone())
                .ok_or_else(|| format!("expected a string, got {}", type_name(value))),
            ParamKind::Number => value
                .is_number()
                .then(|| value.clone())
                .ok_or_else(|| format!("expected a number, got {}", type_name(value))),
            ParamKind::Integer { min, max } => {
                let n = as_integer(value)
                    .ok_or_else(|| format!("expected an integer, got {value}"))?;
                if n < min || n > max {
                    return Err(format!("must be between {min} and {max}, got {n}"));
                }
                Ok(Value::from(n))
            }
            ParamKind::Boolean => value
                .is_boolean()
                .then(|| value.clone())
                .ok_or_else(|| format!("expected a boolean, got {}", type_name(value))),
            ParamKind::Enum(options) => match value.as_str() {
                Some(s) if options.contains(&s) => Ok(value.clone()),
                Some(s) => Err(format!(
                    "must be one of: {}, got \"{s}\"",
                    options.join(", ")
                )),
                None => Err(format!("expected a string, got {}", type_name(value))),
            },
            ParamKind::StringArray => match value.as_array() {
                Some(items) if items.iter().all(Value::is_string) => Ok(value.clone()),
                Some(_) => Err("expected an array of strings".to_string()),
                None => Err(format!("expected an array, got {}", type_name(value))),
            },
        }
    }
}

/// Ordered parameter declarations for one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSchema {
    params: &'static [ParamSpec],
}

impl ToolSchema {
    /// A tool that takes no arguments
    pub const EMPTY: Self = Self { params: &[] };

    pub const fn new(params: &'static [ParamSpec]) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &'static [ParamSpec] {
        self.params
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Names of required parameters, in declaration order
    pub fn required(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().filter(|p| p.required).map(|p| p.name)
    }

    /// JSON Schema document advertised in `tools/list`
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.json_schema()))
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        });

        let required: Vec<&str> = self.required().collect();
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Every field that failed validation for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Names of the rejected fields
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.field.as_str())
    }

    /// Structured form attached to JSON-RPC error responses
    pub fn to_json(&self) -> Value {
        json!({ "errors": self.errors })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid arguments: ")?;
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Arguments that passed [`validate`] for a specific tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs(Map<String, Value>);

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// A string argument the schema marks as required
    pub fn str(&self, name: &str) -> Result<&str> {
        self.opt_str(name)
            .ok_or_else(|| Error::InvalidArgument(format!("missing string argument `{name}`")))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// A required argument of any type
    pub fn value(&self, name: &str) -> Result<&Value> {
        self.0
            .get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("missing argument `{name}`")))
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Validate a raw argument bag against `schema`.
///
/// A missing bag (`null`) is treated as `{}`. Optional fields given as
/// `null` are treated as absent and dropped.
pub fn validate(schema: &ToolSchema, raw: &Value) -> std::result::Result<ValidatedArgs, ValidationError> {
    let empty = Map::new();
    let bag = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => {
            return Err(ValidationError {
                errors: vec![FieldError::new(
                    "arguments",
                    format!("expected an object, got {}", type_name(other)),
                )],
            });
        }
    };

    let mut errors = Vec::new();

    for key in bag.keys() {
        if schema.param(key).is_none() {
            errors.push(FieldError::new(key.as_str(), "unknown parameter"));
        }
    }

    let mut validated = Map::new();
    for param in schema.params() {
        match bag.get(param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    errors.push(FieldError::new(param.name, "is required"));
                }
            }
            Some(value) => match param.check(value) {
                Ok(normalized) => {
                    validated.insert(param.name.to_string(), normalized);
                }
                Err(reason) => errors.push(FieldError::new(param.name, reason)),
            },
        }
    }

    if errors.is_empty() {
        Ok(ValidatedArgs(validated))
    } else {
        Err(ValidationError { errors })
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    #[allow(clippy::cast_possible_truncation)]
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then(|| f as i64)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Error types for the MCP server

use thiserror::Error;

use crate::schema::ValidationError;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during MCP server operations
#[derive(Debug, Error)]
pub enum Error {
    /// The brokerage rejected or failed the remote call
    #[error(transparent)]
    Broker(#[from] alpaca_client::BrokerError),

    /// Tool arguments did not match the tool's schema
    #[error(transparent)]
    Validation(ValidationError),

    /// Unknown tool requested
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A tool name was registered twice
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    /// A handler read an argument its schema does not guarantee
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error on the stdio channel
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

//! Error types for the brokerage boundary

use thiserror::Error;

/// Result type alias for brokerage operations
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Errors reported by a [`crate::Brokerage`]
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The request never produced an HTTP response
    #[error("network error: {0}")]
    Network(String),

    /// The API rejected the credentials (401)
    #[error("authentication failed ({status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    /// The API refused the request because of rate limiting (429)
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// Any other non-success response
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The response body was not valid JSON
    #[error("invalid response body: {0}")]
    Decode(String),

    /// A path template referenced a field absent from the payload
    #[error("missing path parameter: {0}")]
    MissingPathParam(String),

    /// A configured base URL could not be used
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

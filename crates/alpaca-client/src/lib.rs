//! Alpaca brokerage boundary
//!
//! This crate is the single point where the MCP server talks to Alpaca.
//! Everything above it deals in [`BrokerRequest`]s: an [`Endpoint`] plus a
//! flat JSON payload. The [`Brokerage`] trait is the seam; [`AlpacaClient`]
//! is the production implementation and tests substitute their own.
//!
//! ```text
//! [ tool handler ]
//!        | BrokerRequest { endpoint, payload }
//!        v
//! [ Brokerage::execute ]
//!        |
//!        +--> trading API  (account, orders, positions, watchlists, ...)
//!        +--> data API     (quotes, trades, snapshots, news, screener)
//! ```
//!
//! The client performs exactly one HTTP exchange per request. It does not
//! retry, cache or time out locally; failures are reported as [`BrokerError`].

pub mod client;
pub mod endpoint;
pub mod error;

pub use client::{AlpacaClient, Credentials, DEFAULT_DATA_URL, PAPER_TRADING_URL};
pub use endpoint::{ApiBase, BrokerRequest, Endpoint, Route};
pub use error::{BrokerError, Result};

use async_trait::async_trait;
use serde_json::Value;

/// A remote brokerage able to execute one request at a time.
///
/// Implementations own connection pooling and authentication. The returned
/// value is the decoded response body, passed through verbatim.
#[async_trait]
pub trait Brokerage: Send + Sync {
    async fn execute(&self, request: BrokerRequest) -> Result<Value>;
}

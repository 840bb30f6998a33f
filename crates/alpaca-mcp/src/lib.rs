//! MCP Server for Alpaca
//!
//! This crate exposes Alpaca brokerage operations (account, orders,
//! positions, options, watchlists, corporate actions, news and market data)
//! as Model Context Protocol tools over line-delimited JSON-RPC on stdio.
//!
//! # Architecture
//!
//! ```text
//! [ MCP Client ]
//!        | (JSON-RPC over stdio)
//!        v
//! [ server ] --> [ registry ] --> schema::validate --> [ handlers ]
//!                                                          |
//!                                                          v
//!                                            [ alpaca-client::Brokerage ]
//!                                                          |
//!                                                          v
//!                                     [ Alpaca trading / market data REST ]
//! ```
//!
//! Each tool declares its parameters once as static data. The registry
//! validates raw arguments against that declaration before the handler runs,
//! so invalid calls never reach Alpaca. Handlers perform exactly one
//! brokerage call and shape the response into a single text block.
//!
//! # Tools
//!
//! See [`tools`] for the full catalog.

pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod server;
pub mod shape;
pub mod tools;

pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use registry::ToolRegistry;
pub use schema::{FieldError, ParamKind, ParamSpec, ToolSchema, ValidatedArgs, ValidationError};
pub use server::AlpacaMcpServer;
pub use tools::{ToolContent, ToolContext, ToolDefinition, ToolResult, get_tool_definitions};

//! Alpaca MCP Server
//!
//! A Model Context Protocol server that exposes Alpaca trading and market
//! data operations as tools.
//!
//! # Usage
//!
//! ```bash
//! alpaca-mcp [--env-file <path>] [--trading-url <url>] [--data-url <url>]
//! ```
//!
//! # Environment Variables
//!
//! - `ALPACA_PAPER_KEY`, `ALPACA_PAPER_SECRET`: API credentials (required)
//! - `ALPACA_MCP_ENV_FILE`: dotenv file to load instead of `./.env`
//! - `ALPACA_TRADING_URL`, `ALPACA_DATA_URL`: API host overrides
//! - `RUST_LOG`: Control log verbosity (default: `alpaca_mcp=info`)
//!
//! # Protocol
//!
//! The server communicates via JSON-RPC 2.0 over stdio:
//! - Requests/responses go through stdout
//! - Logs go to stderr (to avoid interfering with the protocol)

use std::path::PathBuf;
use std::sync::Arc;

use alpaca_mcp::{AlpacaMcpServer, Config, config};
use clap::Parser;

/// MCP server for Alpaca
#[derive(Parser)]
#[command(name = "alpaca-mcp")]
#[command(about = "MCP server for Alpaca trading and market data")]
#[command(version)]
struct Args {
    /// Dotenv file holding ALPACA_PAPER_KEY and ALPACA_PAPER_SECRET
    #[arg(long, env = "ALPACA_MCP_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Trading API base URL
    #[arg(long, env = "ALPACA_TRADING_URL")]
    trading_url: Option<String>,

    /// Market data API base URL
    #[arg(long, env = "ALPACA_DATA_URL")]
    data_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging to stderr (stdout is reserved for MCP protocol)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("alpaca_mcp=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Some(path) = config::load_env_file(args.env_file.as_deref())? {
        tracing::info!(path = %path.display(), "Loaded env file");
    }

    let mut config = Config::from_env()?;
    if let Some(url) = args.trading_url {
        config = config.with_trading_url(url);
    }
    if let Some(url) = args.data_url {
        config = config.with_data_url(url);
    }

    let client = config.client()?;
    tracing::info!(
        trading_url = %client.trading_url(),
        data_url = %client.data_url(),
        "Starting alpaca-mcp server"
    );

    let server = AlpacaMcpServer::with_broker(Arc::new(client))?;
    server.run().await?;

    Ok(())
}

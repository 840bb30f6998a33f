//! Process configuration
//!
//! Credentials come from the environment, optionally seeded from a dotenv
//! file. Both `ALPACA_PAPER_KEY` and `ALPACA_PAPER_SECRET` must be set and
//! non-empty before the server starts.

use std::path::{Path, PathBuf};

use alpaca_client::{AlpacaClient, BrokerError, Credentials, DEFAULT_DATA_URL, PAPER_TRADING_URL};
use thiserror::Error;

pub const KEY_VAR: &str = "ALPACA_PAPER_KEY";
pub const SECRET_VAR: &str = "ALPACA_PAPER_SECRET";

/// Startup configuration failures; all of them are fatal
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(&'static str),

    #[error("environment variable {0} must not be empty")]
    EmptyValue(&'static str),

    #[error("failed to load env file {path}: {message}")]
    EnvFile { path: PathBuf, message: String },

    #[error("failed to build Alpaca client: {0}")]
    Client(#[from] BrokerError),
}

/// Everything needed to reach Alpaca
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub trading_url: String,
    pub data_url: String,
}

impl Config {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = required(&lookup, KEY_VAR)?;
        let secret = required(&lookup, SECRET_VAR)?;

        Ok(Self {
            credentials: Credentials::new(key, secret),
            trading_url: PAPER_TRADING_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
        })
    }

    pub fn with_trading_url(mut self, url: impl Into<String>) -> Self {
        self.trading_url = url.into();
        self
    }

    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = url.into();
        self
    }

    /// Build the HTTP client for this configuration
    pub fn client(&self) -> Result<AlpacaClient, ConfigError> {
        Ok(AlpacaClient::with_base_urls(
            self.credentials.clone(),
            &self.trading_url,
            &self.data_url,
        )?)
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or(ConfigError::MissingEnvVar(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(name));
    }
    Ok(value)
}

/// Load a dotenv file into the process environment.
///
/// With an explicit `path` the file must exist. Without one, a `.env` in the
/// current directory or an ancestor is loaded if there is one. Variables
/// already set in the environment are not overridden.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|()| Some(path.to_path_buf()))
            .map_err(|e| ConfigError::EnvFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                message: e.to_string(),
            }),
        },
    }
}

//! reqwest-backed Alpaca client

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::endpoint::{ApiBase, BrokerRequest, Route};
use crate::{BrokerError, Brokerage, Result};

/// Paper trading API host
pub const PAPER_TRADING_URL: &str = "https://paper-api.alpaca.markets";

/// Market data API host
pub const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";

const KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_HEADER: &str = "APCA-API-SECRET-KEY";

/// Alpaca API credentials.
#[derive(Clone)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"[REDACTED]")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Error body returned by Alpaca on non-success responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<Value>,
    message: String,
}

/// Client for the Alpaca trading and market data REST APIs.
///
/// One instance is created at startup and shared by every tool invocation.
/// The underlying `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct AlpacaClient {
    http: Client,
    credentials: Credentials,
    trading_url: Url,
    data_url: Url,
}

impl AlpacaClient {
    /// Create a client against the paper trading and default data hosts
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_base_urls(credentials, PAPER_TRADING_URL, DEFAULT_DATA_URL)
    }

    /// Create a client against explicit hosts
    pub fn with_base_urls(
        credentials: Credentials,
        trading_url: &str,
        data_url: &str,
    ) -> Result<Self> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| BrokerError::InvalidUrl(format!("{raw}: {e}")))
        };
        let http = Client::builder()
            .user_agent(concat!("alpaca-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            credentials,
            trading_url: parse(trading_url)?,
            data_url: parse(data_url)?,
        })
    }

    pub fn trading_url(&self) -> &Url {
        &self.trading_url
    }

    pub fn data_url(&self) -> &Url {
        &self.data_url
    }

    /// Build the request URL, consuming path parameters from `params`
    fn url_for(&self, route: &Route, params: &mut Map<String, Value>) -> Result<Url> {
        let mut url = match route.base {
            ApiBase::Trading => self.trading_url.clone(),
            ApiBase::Data => self.data_url.clone(),
        };

        let mut segments = Vec::new();
        for segment in route.path.split('/').filter(|s| !s.is_empty()) {
            match segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                Some(name) => {
                    let value = params
                        .remove(name)
                        .ok_or_else(|| BrokerError::MissingPathParam(name.to_string()))?;
                    segments.push(param_to_string(&value));
                }
                None => segments.push(segment.to_string()),
            }
        }

        url.path_segments_mut()
            .map_err(|()| BrokerError::InvalidUrl("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}

#[async_trait]
impl Brokerage for AlpacaClient {
    async fn execute(&self, request: BrokerRequest) -> Result<Value> {
        let route = request.endpoint.route();
        let mut params = request.endpoint.wire_params(request.payload);
        let url = self.url_for(&route, &mut params)?;

        tracing::debug!(
            endpoint = ?request.endpoint,
            method = %route.method,
            url = %url,
            "Sending brokerage request"
        );

        let mut builder = self
            .http
            .request(route.method.clone(), url)
            .header(KEY_HEADER, self.credentials.key())
            .header(SECRET_HEADER, self.credentials.secret());

        if route.sends_body() {
            builder = builder.json(&Value::Object(params));
        } else if !params.is_empty() {
            let query: Vec<(String, String)> = params
                .iter()
                .map(|(k, v)| (k.clone(), param_to_string(v)))
                .collect();
            builder = builder.query(&query);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        Err(error_from_response(status, &text))
    }
}

/// Map a non-success response onto a [`BrokerError`]
fn error_from_response(status: StatusCode, body: &str) -> BrokerError {
    let (code, message) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => (parsed.code.map(|c| param_to_string(&c)), parsed.message),
        Err(_) if body.trim().is_empty() => (None, status.to_string()),
        Err(_) => (None, body.to_string()),
    };

    tracing::warn!(status = status.as_u16(), code = ?code, message = %message, "Brokerage request failed");

    match status {
        // 403 also covers business rejections such as insufficient buying power
        StatusCode::UNAUTHORIZED => BrokerError::AuthenticationFailed {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => BrokerError::RateLimited { message },
        _ => BrokerError::Api {
            status: status.as_u16(),
            code,
            message,
        },
    }
}

/// Render a payload value as a path segment or query value.
///
/// Arrays become comma-separated lists, which is how Alpaca accepts
/// multi-valued filters such as `symbols`.
fn param_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(param_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! MCP Server implementation
//!
//! The main server struct that coordinates MCP protocol handling with the
//! tool registry and the brokerage.

use std::sync::Arc;

use alpaca_client::Brokerage;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, METHOD_NOT_FOUND, PROTOCOL_VERSION, ServerCapabilities, ServerInfo,
    ToolCallParams, ToolsCapability,
};
use crate::registry::ToolRegistry;
use crate::tools::ToolContext;
use crate::{Error, Result};

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "alpaca";

/// MCP Server exposing Alpaca operations as tools
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use alpaca_client::{AlpacaClient, Credentials};
/// use alpaca_mcp::AlpacaMcpServer;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = AlpacaClient::new(Credentials::new("key", "secret"))?;
///     let server = AlpacaMcpServer::with_broker(Arc::new(client))?;
///     server.run().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct AlpacaMcpServer {
    registry: Arc<ToolRegistry>,
    context: ToolContext,
}

impl AlpacaMcpServer {
    pub fn new(registry: Arc<ToolRegistry>, broker: Arc<dyn Brokerage>) -> Self {
        Self {
            registry,
            context: ToolContext::new(broker),
        }
    }

    /// Server with the full Alpaca tool catalog
    pub fn with_broker(broker: Arc<dyn Brokerage>) -> Result<Self> {
        Ok(Self::new(Arc::new(ToolRegistry::alpaca()?), broker))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run the MCP server on stdin/stdout until stdin closes
    pub async fn run(&self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Process line-delimited JSON-RPC messages from `reader`, writing one
    /// response line per request to `writer`.
    ///
    /// A line that is not UTF-8 or not JSON is answered with a parse error
    /// and the loop keeps reading.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(tools = self.registry.len(), "MCP server ready, listening on stdio");

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(text) => {
                    let line = text.trim();
                    if line.is_empty() {
                        continue;
                    }
                    tracing::debug!(request = %line, "Received message");
                    self.respond_to_line(line).await?
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Message is not valid UTF-8");
                    serde_json::to_string(&JsonRpcResponse::parse_error(format!(
                        "Parse error: {e}"
                    )))?
                }
            };

            if response.is_empty() {
                continue;
            }
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Response line for one message; errors become JSON-RPC error responses
    async fn respond_to_line(&self, line: &str) -> Result<String> {
        let response = match self.handle_message(line).await {
            Ok(response) => return Ok(response),
            Err(Error::Json(e)) => {
                tracing::warn!(error = %e, "Unparseable message");
                JsonRpcResponse::parse_error(format!("Parse error: {e}"))
            }
            Err(e) => JsonRpcResponse::error(None, INTERNAL_ERROR, format!("Internal error: {e}")),
        };
        Ok(serde_json::to_string(&response)?)
    }

    /// Handle a single MCP message
    ///
    /// Returns the JSON-RPC response as a string, or an empty string for
    /// notifications. Input that is not JSON at all is an [`Error::Json`];
    /// JSON that is not a request is answered with `-32600`.
    pub async fn handle_message(&self, message: &str) -> Result<String> {
        let raw: Value = serde_json::from_str(message)?;

        let request: JsonRpcRequest = match serde_json::from_value(raw.clone()) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed request");
                let id = raw.get("id").filter(|id| !id.is_null()).cloned();
                let response =
                    JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {e}"));
                return serde_json::to_string(&response).map_err(Error::from);
            }
        };

        if request.jsonrpc != "2.0" {
            let response = JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            );
            return serde_json::to_string(&response).map_err(Error::from);
        }

        let response = match request.method.as_str() {
            "initialized" | "notifications/initialized" => return Ok(String::new()),
            _ if request.is_notification() => {
                tracing::debug!(method = %request.method, "Ignoring notification");
                return Ok(String::new());
            }
            "initialize" => self.handle_initialize(request.id, request.params)?,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await?,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        serde_json::to_string(&response).map_err(Error::from)
    }

    fn handle_initialize(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        if let Ok(InitializeParams {
            protocol_version,
            client_info: Some(client),
            ..
        }) = serde_json::from_value::<InitializeParams>(params)
        {
            tracing::info!(client = %client.name, version = %client.version, %protocol_version, "Client connected");
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<Value> = self
            .registry
            .definitions()
            .iter()
            .map(|t| t.to_listing())
            .collect();

        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let call: ToolCallParams = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                ));
            }
        };

        let response = match self
            .registry
            .call(&self.context, &call.name, &call.arguments)
            .await
        {
            Ok(result) => JsonRpcResponse::success(id, serde_json::to_value(result)?),
            Err(Error::UnknownTool(name)) => {
                JsonRpcResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {name}"))
            }
            Err(Error::Validation(err)) => JsonRpcResponse::error_with_data(
                id,
                INVALID_PARAMS,
                format!("Invalid arguments for tool {}: {err}", call.name),
                err.to_json(),
            ),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Internal error: {e}")),
        };
        Ok(response)
    }
}

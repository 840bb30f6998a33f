//! MCP Protocol message types
//!
//! JSON-RPC 2.0 message structures for MCP communication.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol revision this server speaks
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Requests without an id expect no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 Response
///
/// `id` is always serialized; a response to an unparseable message carries
/// `"id": null`.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Error response with a structured `data` member
    pub fn error_with_data(id: Option<Value>, code: i32, message: String, data: Value) -> Self {
        let mut response = Self::error(id, code, message);
        if let Some(error) = response.error.as_mut() {
            error.data = Some(data);
        }
        response
    }

    pub fn parse_error(message: String) -> Self {
        Self::error(None, PARSE_ERROR, message)
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Initialize request params
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Initialize response result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Tool call params
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_request_deserialize() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "1.0"}
            }
        }"#;
        let request: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.method, "initialize");
        assert!(!request.is_notification());
    }

    #[test]
    fn test_response_serialize() {
        let response = JsonRpcResponse::success(Some(json!(1)), json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("result"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_error_response_serialize() {
        let response =
            JsonRpcResponse::error(Some(json!(1)), INVALID_REQUEST, "Invalid Request".to_string());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("-32600"));
    }

    #[test]
    fn test_parse_error_has_null_id() {
        let response = JsonRpcResponse::parse_error("Parse error".to_string());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], Value::Null);
        assert!(value.as_object().unwrap().contains_key("id"));
        assert_eq!(value["error"]["code"], PARSE_ERROR);
    }

    #[test]
    fn test_error_with_data() {
        let response = JsonRpcResponse::error_with_data(
            Some(json!(7)),
            INVALID_PARAMS,
            "Invalid arguments".to_string(),
            json!({"errors": [{"field": "symbol", "reason": "is required"}]}),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["data"]["errors"][0]["field"], "symbol");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_jsonrpc_request_with_string_id() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": "abc-123",
            "method": "tools/list",
            "params": {}
        }"#;
        let request: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.id, Some(Value::String("abc-123".to_string())));
        assert_eq!(request.method, "tools/list");
    }

    #[test]
    fn test_jsonrpc_request_without_id_is_notification() {
        let json = r#"{
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }"#;
        let request: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert!(request.is_notification());
        assert_eq!(request.method, "notifications/initialized");
    }

    #[test]
    fn test_jsonrpc_request_without_params() {
        let json = r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list"}"#;
        let request: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.params, Value::Null);
    }

    #[test]
    fn test_initialize_params_without_client_info() {
        let params: InitializeParams =
            serde_json::from_value(json!({"protocolVersion": "2024-11-05"})).unwrap();
        assert_eq!(params.protocol_version, "2024-11-05");
        assert!(params.client_info.is_none());
    }

    #[test]
    fn test_initialize_result_serialize() {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "alpaca".to_string(),
                version: "0.1.0".to_string(),
            },
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["protocolVersion"], "2024-11-05");
        assert_eq!(value["serverInfo"]["name"], "alpaca");
        assert_eq!(value["capabilities"]["tools"]["listChanged"], false);
    }

    #[test]
    fn test_tool_call_params_deserialize() {
        let json = r#"{
            "name": "alpaca-getOrders",
            "arguments": {"status": "open", "limit": 10}
        }"#;
        let params: ToolCallParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.name, "alpaca-getOrders");
        assert_eq!(params.arguments["status"], "open");
        assert_eq!(params.arguments["limit"], 10);
    }

    #[test]
    fn test_tool_call_params_without_arguments() {
        let json = r#"{"name": "alpaca-getAccount"}"#;
        let params: ToolCallParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.name, "alpaca-getAccount");
        assert_eq!(params.arguments, Value::Null);
    }

    #[test]
    fn test_json_rpc_error_codes() {
        let cases = [
            (PARSE_ERROR, -32700),
            (INVALID_REQUEST, -32600),
            (METHOD_NOT_FOUND, -32601),
            (INVALID_PARAMS, -32602),
            (INTERNAL_ERROR, -32603),
        ];
        for (code, expected) in cases {
            let response = JsonRpcResponse::error(None, code, "x".to_string());
            assert_eq!(response.error.as_ref().unwrap().code, expected);
        }
    }
}

//! Tool contract tests
//!
//! Every tool is driven through the JSON-RPC surface against a scripted
//! brokerage. Arguments are generated from each tool's declared schema, so
//! these tests cover the whole catalog without a per-tool fixture.

use std::sync::Arc;

use alpaca_client::Endpoint;
use alpaca_mcp::{AlpacaMcpServer, ParamKind, ParamSpec, ToolDefinition, get_tool_definitions};
use alpaca_test_utils::StubBrokerage;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Map, Value, json};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Tools whose response is normalized to a sequence and counted
const BULK_TOOLS: &[&str] = &[
    "alpaca-getActivities",
    "alpaca-getOrders",
    "alpaca-cancelOrders",
    "alpaca-getPositions",
    "alpaca-closePositions",
    "alpaca-getOptionsContracts",
    "alpaca-getWatchlists",
    "alpaca-getCorporateActions",
    "alpaca-getStocksCorporateActions",
    "alpaca-getNews",
    "alpaca-getStocksMostActives",
    "alpaca-getStocksMarketMovers",
    "alpaca-getStocksQuotes",
    "alpaca-getStocksQuotesLatest",
    "alpaca-getStocksSnapshots",
    "alpaca-getStocksConditions",
    "alpaca-getStocksExchangeCodes",
    "alpaca-getStocksTrades",
    "alpaca-getStocksTradesLatest",
];

struct Harness {
    stub: Arc<StubBrokerage>,
    server: AlpacaMcpServer,
}

impl Harness {
    fn new(stub: StubBrokerage) -> Self {
        let stub = Arc::new(stub);
        let server = AlpacaMcpServer::with_broker(stub.clone()).unwrap();
        Self { stub, server }
    }

    async fn call(&self, name: &str, arguments: Value) -> Value {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        });
        let response = self
            .server
            .handle_message(&request.to_string())
            .await
            .unwrap();
        serde_json::from_str(&response).unwrap()
    }
}

/// A value that satisfies `param`
fn sample(param: &ParamSpec) -> Value {
    match param.kind {
        ParamKind::String => json!("AAPL"),
        ParamKind::Number => json!(12.5),
        ParamKind::Integer { min, .. } => json!(min),
        ParamKind::Boolean => json!(true),
        ParamKind::Enum(options) => json!(options[0]),
        ParamKind::StringArray => json!(["AAPL", "TSLA"]),
    }
}

fn args_for<'a>(tool: &ToolDefinition, params: impl Iterator<Item = &'a ParamSpec>) -> Map<String, Value> {
    let mut args: Map<String, Value> = params.map(|p| (p.name.to_string(), sample(p))).collect();
    if tool.name == "alpaca-createOrder" && args.contains_key("limit_price") {
        args.insert("type".to_string(), json!("limit"));
    }
    args
}

fn required_args(tool: &ToolDefinition) -> Map<String, Value> {
    args_for(tool, tool.schema.params().iter().filter(|p| p.required))
}

fn all_args(tool: &ToolDefinition) -> Map<String, Value> {
    args_for(tool, tool.schema.params().iter())
}

fn text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

fn error_fields(response: &Value) -> Vec<String> {
    response["error"]["data"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap().to_string())
        .collect()
}

fn sorted_keys(map: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

// =============================================================================
// Validation happens before any remote call
// =============================================================================

#[tokio::test]
async fn test_missing_required_field_never_reaches_brokerage() {
    for tool in get_tool_definitions() {
        for missing in tool.schema.required() {
            let harness = Harness::new(StubBrokerage::new());
            let mut args = required_args(&tool);
            args.remove(missing);

            let response = harness.call(tool.name, Value::Object(args)).await;

            assert_eq!(response["error"]["code"], -32602, "{} without {missing}", tool.name);
            assert_eq!(error_fields(&response), vec![missing.to_string()]);
            assert_eq!(harness.stub.call_count(), 0, "{} made a remote call", tool.name);
        }
    }
}

#[tokio::test]
async fn test_out_of_set_enum_value_is_rejected() {
    for tool in get_tool_definitions() {
        for param in tool.schema.params() {
            if !matches!(param.kind, ParamKind::Enum(_)) {
                continue;
            }
            let harness = Harness::new(StubBrokerage::new());
            let mut args = required_args(&tool);
            args.insert(param.name.to_string(), json!("not-a-choice"));

            let response = harness.call(tool.name, Value::Object(args)).await;

            assert_eq!(error_fields(&response), vec![param.name.to_string()], "{}", tool.name);
            assert_eq!(harness.stub.call_count(), 0);
        }
    }
}

#[tokio::test]
async fn test_integer_bounds_are_inclusive() {
    for tool in get_tool_definitions() {
        for param in tool.schema.params() {
            let ParamKind::Integer { min, max } = param.kind else {
                continue;
            };

            for (value, accepted) in [(min - 1, false), (min, true), (max, true), (max + 1, false)] {
                let harness = Harness::new(StubBrokerage::new());
                let mut args = required_args(&tool);
                args.insert(param.name.to_string(), json!(value));

                let response = harness.call(tool.name, Value::Object(args)).await;

                assert_eq!(
                    response.get("error").is_none(),
                    accepted,
                    "{}.{} = {value}",
                    tool.name,
                    param.name
                );
                assert_eq!(harness.stub.call_count(), usize::from(accepted));
            }
        }
    }
}

#[tokio::test]
async fn test_unknown_parameter_is_rejected() {
    for tool in get_tool_definitions() {
        let harness = Harness::new(StubBrokerage::new());
        let mut args = required_args(&tool);
        args.insert("unexpected_field".to_string(), json!(1));

        let response = harness.call(tool.name, Value::Object(args)).await;

        assert_eq!(error_fields(&response), vec!["unexpected_field".to_string()]);
        assert_eq!(harness.stub.call_count(), 0);
    }
}

#[tokio::test]
async fn test_get_orders_limit_above_maximum() {
    let harness = Harness::new(StubBrokerage::new());

    let response = harness.call("alpaca-getOrders", json!({"limit": 2000})).await;

    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(error_fields(&response), vec!["limit".to_string()]);
    assert_eq!(harness.stub.call_count(), 0);
}

// =============================================================================
// Outgoing payloads
// =============================================================================

#[tokio::test]
async fn test_required_only_payload_has_exactly_required_keys() {
    for tool in get_tool_definitions() {
        let harness = Harness::new(StubBrokerage::new());
        let args = required_args(&tool);

        let response = harness.call(tool.name, Value::Object(args.clone())).await;

        assert!(response.get("error").is_none(), "{}: {response}", tool.name);
        assert_eq!(harness.stub.call_count(), 1, "{}", tool.name);
        assert_eq!(
            sorted_keys(&harness.stub.last_payload()),
            sorted_keys(&args),
            "{}",
            tool.name
        );
    }
}

#[tokio::test]
async fn test_supplied_optionals_are_forwarded() {
    for tool in get_tool_definitions() {
        let harness = Harness::new(StubBrokerage::new());
        let args = all_args(&tool);

        harness.call(tool.name, Value::Object(args.clone())).await;

        assert_eq!(
            sorted_keys(&harness.stub.last_payload()),
            sorted_keys(&args),
            "{}",
            tool.name
        );
    }
}

#[rstest]
#[case("limit", true)]
#[case("market", false)]
#[case("stop", false)]
#[case("stop_limit", false)]
#[tokio::test]
async fn test_limit_price_only_sent_for_limit_orders(#[case] order_type: &str, #[case] sent: bool) {
    let harness = Harness::new(StubBrokerage::new());

    harness
        .call(
            "alpaca-createOrder",
            json!({
                "symbol": "AAPL",
                "qty": 10,
                "side": "buy",
                "type": order_type,
                "time_in_force": "day",
                "limit_price": 150.25
            }),
        )
        .await;

    let payload = harness.stub.last_payload();
    assert_eq!(payload.contains_key("limit_price"), sent);
    if sent {
        assert_eq!(payload["limit_price"], 150.25);
    }
}

// =============================================================================
// Result shaping
// =============================================================================

#[tokio::test]
async fn test_bulk_tools_wrap_single_values() {
    let tools = get_tool_definitions();
    for name in BULK_TOOLS {
        let tool = tools.iter().find(|t| t.name == *name).unwrap();
        let harness = Harness::new(StubBrokerage::new().respond_all(json!({"id": "only"})));

        let response = harness.call(tool.name, Value::Object(required_args(tool))).await;

        let (summary, dump) = text(&response).split_once("\n\n").unwrap();
        assert!(summary.contains(" 1 "), "{name}: {summary}");
        let dumped: Value = serde_json::from_str(dump).unwrap();
        assert_eq!(dumped, json!([{"id": "only"}]), "{name}");
    }
}

#[tokio::test]
async fn test_get_positions_counts_positions() {
    let positions = json!([
        {"symbol": "AAPL", "qty": "10"},
        {"symbol": "TSLA", "qty": "5"},
        {"symbol": "MSFT", "qty": "1"}
    ]);
    let harness =
        Harness::new(StubBrokerage::new().respond(Endpoint::GetPositions, positions.clone()));

    let response = harness.call("alpaca-getPositions", json!({})).await;

    let body = text(&response);
    assert!(body.starts_with("Fetched 3 position(s).\n\n"), "got: {body}");
    let dumped: Value = serde_json::from_str(body.split_once("\n\n").unwrap().1).unwrap();
    assert_eq!(dumped, positions);
}

#[tokio::test]
async fn test_cancel_order_summary() {
    let canceled = json!({"id": "abc-123", "status": "canceled"});
    let harness =
        Harness::new(StubBrokerage::new().respond(Endpoint::CancelOrder, canceled.clone()));

    let response = harness
        .call("alpaca-cancelOrder", json!({"order_id": "abc-123"}))
        .await;

    let expected = format!(
        "Order abc-123 canceled successfully.\n\n{}",
        serde_json::to_string_pretty(&canceled).unwrap()
    );
    assert_eq!(text(&response), expected);
    assert_eq!(
        Value::Object(harness.stub.last_payload()),
        json!({"order_id": "abc-123"})
    );
}

#[tokio::test]
async fn test_create_order_summary_uses_fill_price() {
    let harness = Harness::new(StubBrokerage::new().respond(
        Endpoint::CreateOrder,
        json!({
            "id": "o-1",
            "symbol": "AAPL",
            "side": "buy",
            "qty": "10",
            "filled_avg_price": "149.98",
            "limit_price": "150.25"
        }),
    ));

    let response = harness
        .call(
            "alpaca-createOrder",
            json!({"symbol": "aapl", "qty": 10, "side": "buy", "type": "limit",
                   "time_in_force": "day", "limit_price": 150.25}),
        )
        .await;

    assert!(text(&response).starts_with("Order placed! BUY 10 AAPL @ 149.98\n\n"));
}

#[tokio::test]
async fn test_remote_failure_surfaces_remote_message() {
    let harness = Harness::new(StubBrokerage::new().fail(
        Endpoint::CreateOrder,
        403,
        "insufficient buying power",
    ));

    let response = harness
        .call(
            "alpaca-createOrder",
            json!({"symbol": "AAPL", "qty": 1000000, "side": "buy", "type": "market", "time_in_force": "day"}),
        )
        .await;

    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    assert!(text(&response).contains("insufficient buying power"));
}

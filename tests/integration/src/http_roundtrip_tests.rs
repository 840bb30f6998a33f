//! Full-stack tests: JSON-RPC request in, HTTP request to a mock Alpaca out.

use std::sync::Arc;

use alpaca_client::{AlpacaClient, Credentials};
use alpaca_mcp::AlpacaMcpServer;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn server_for(mock: &MockServer) -> AlpacaMcpServer {
    let client = AlpacaClient::with_base_urls(
        Credentials::new("PKTEST", "secret"),
        &mock.uri(),
        &mock.uri(),
    )
    .unwrap();
    AlpacaMcpServer::with_broker(Arc::new(client)).unwrap()
}

async fn call(server: &AlpacaMcpServer, name: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    serde_json::from_str(&server.handle_message(&request.to_string()).await.unwrap()).unwrap()
}

fn text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn test_create_limit_order_over_http() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .and(header("APCA-API-KEY-ID", "PKTEST"))
        .and(body_json(json!({
            "symbol": "AAPL",
            "qty": 10,
            "side": "buy",
            "type": "limit",
            "time_in_force": "day",
            "limit_price": 150.25
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "o-1",
            "symbol": "AAPL",
            "side": "buy",
            "qty": "10",
            "filled_avg_price": null,
            "limit_price": "150.25"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(&mock);
    let response = call(
        &server,
        "alpaca-createOrder",
        json!({"symbol": "aapl", "qty": 10, "side": "buy", "type": "limit",
               "time_in_force": "day", "limit_price": 150.25}),
    )
    .await;

    assert!(text(&response).starts_with("Order placed! BUY 10 AAPL @ 150.25\n\n"));
}

#[tokio::test]
async fn test_cancel_order_with_no_content() {
    let mock = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/orders/abc-123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(&mock);
    let response = call(&server, "alpaca-cancelOrder", json!({"order_id": "abc-123"})).await;

    assert!(text(&response).starts_with("Order abc-123 canceled successfully."));
}

#[tokio::test]
async fn test_options_contract_search_uses_wire_names() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/options/contracts"))
        .and(query_param("underlying_symbols", "AAPL"))
        .and(query_param("strike_price_gte", "150"))
        .and(query_param("strike_price_lte", "150"))
        .and(query_param("type", "call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"symbol": "AAPL250620C00150000"}])))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(&mock);
    let response = call(
        &server,
        "alpaca-getOptionsContracts",
        json!({"symbol_or_contract_id": "AAPL", "strike_price": 150, "option_type": "call"}),
    )
    .await;

    assert!(text(&response).starts_with("Found 1 contract(s)."));
}

#[tokio::test]
async fn test_market_data_uses_query_string() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/trades/latest"))
        .and(query_param("symbols", "AAPL,TSLA"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trades": {"AAPL": {"p": 190.1}, "TSLA": {"p": 250.3}}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(&mock);
    let response = call(
        &server,
        "alpaca-getStocksTradesLatest",
        json!({"symbols": "AAPL,TSLA", "limit": 5}),
    )
    .await;

    assert!(text(&response).starts_with("Fetched 1 latest trade(s) for AAPL,TSLA."));
}

#[tokio::test]
async fn test_watchlist_update_sends_symbol_array() {
    let mock = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v2/watchlists/wl-1"))
        .and(body_json(json!({"name": "Tech", "symbols": ["AAPL", "MSFT"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "wl-1", "name": "Tech"})))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(&mock);
    let response = call(
        &server,
        "alpaca-updateWatchlist",
        json!({"watchlist_id": "wl-1", "name": "Tech", "symbols": ["AAPL", "MSFT"]}),
    )
    .await;

    let dumped: Value = serde_json::from_str(text(&response)).unwrap();
    assert_eq!(dumped["name"], "Tech");
}

#[tokio::test]
async fn test_api_error_becomes_error_result() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/positions/ZZZZ"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"code": 40410000, "message": "position does not exist"})),
        )
        .mount(&mock)
        .await;

    let server = server_for(&mock);
    let response = call(&server, "alpaca-getPosition", json!({"symbol_or_asset_id": "ZZZZ"})).await;

    assert_eq!(response["result"]["isError"], true);
    assert!(text(&response).contains("position does not exist"));
}

#[tokio::test]
async fn test_invalid_arguments_send_no_http_request() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock)
        .await;

    let server = server_for(&mock);
    let response = call(&server, "alpaca-getNews", json!({"symbols": "AAPL", "limit": 101})).await;

    assert_eq!(response["error"]["code"], -32602);
}

//! MCP Tool definitions
//!
//! Every tool pairs a name and description with a declarative
//! [`ToolSchema`] and a handler from [`crate::handlers`]. The catalog below
//! is the single source for both `tools/list` and dispatch.
//!
//! # Tool Categories
//!
//! ## Account
//! - `alpaca-getAccount`, `alpaca-getPortfolioHistory`
//! - `alpaca-getActivity`, `alpaca-getActivities`
//!
//! ## Orders
//! - `alpaca-createOrder`, `alpaca-getOrder`, `alpaca-getOrders`
//! - `alpaca-replaceOrder`, `alpaca-cancelOrder`, `alpaca-cancelOrders`
//!
//! ## Positions & Options
//! - `alpaca-getPosition`, `alpaca-getPositions`
//! - `alpaca-closePosition`, `alpaca-closePositions`
//! - `alpaca-exerciseOption`, `alpaca-getOptionsContract`, `alpaca-getOptionsContracts`
//!
//! ## Watchlists
//! - `alpaca-getWatchlist`, `alpaca-getWatchlists`, `alpaca-createWatchlist`
//! - `alpaca-updateWatchlist`, `alpaca-deleteWatchlist`
//!
//! ## Corporate Actions
//! - `alpaca-getCorporateAction`, `alpaca-getCorporateActions`,
//!   `alpaca-getStocksCorporateActions`
//!
//! ## News, Screener & Market Data
//! - `alpaca-getNews`, `alpaca-getStocksMostActives`, `alpaca-getStocksMarketMovers`
//! - `alpaca-getStocksQuotes`, `alpaca-getStocksQuotesLatest`, `alpaca-getStocksSnapshots`
//! - `alpaca-getStocksConditions`, `alpaca-getStocksExchangeCodes`
//! - `alpaca-getStocksTrades`, `alpaca-getStocksTradesLatest`

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use alpaca_client::{BrokerRequest, Brokerage, Endpoint};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::handlers;
use crate::{Error, Result};
use crate::schema::{ParamKind, ParamSpec, ToolSchema, ValidatedArgs};

/// Result from a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content types for tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    /// Text of the first content block
    pub fn first_text(&self) -> &str {
        match self.content.first() {
            Some(ToolContent::Text { text }) => text,
            None => "",
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ToolContext {
    broker: Arc<dyn Brokerage>,
}

impl ToolContext {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self { broker }
    }

    /// Perform the single remote call of an invocation
    pub async fn execute(&self, endpoint: Endpoint, payload: Map<String, Value>) -> Result<Value> {
        let body = Value::Object(payload.clone());
        tracing::debug!(?endpoint, payload = %body, "Calling brokerage");
        self.broker
            .execute(BrokerRequest::with_payload(endpoint, payload))
            .await
            .map_err(|err| {
                tracing::warn!(?endpoint, error = %err, "Brokerage call failed");
                Error::from(err)
            })
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext").finish_non_exhaustive()
    }
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolResult>> + Send + 'a>>;

/// Handler bound to a tool
pub type ToolHandler = for<'a> fn(&'a ToolContext, ValidatedArgs) -> HandlerFuture<'a>;

/// Tool definition for MCP protocol
#[derive(Clone, Copy)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: ToolSchema,
    pub handler: ToolHandler,
}

impl ToolDefinition {
    /// Entry for the `tools/list` response
    pub fn to_listing(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.schema.to_json_schema(),
        })
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Parameter sets
// ============================================================================

pub const ORDER_SIDES: &[&str] = &["buy", "sell"];
pub const ORDER_TYPES: &[&str] = &["market", "limit", "stop", "stop_limit"];
pub const TIME_IN_FORCE: &[&str] = &["day", "gtc", "ioc", "fok"];
pub const ORDER_STATUSES: &[&str] = &["open", "closed", "all"];
pub const SORT_DIRECTIONS: &[&str] = &["asc", "desc"];
pub const OPTION_TYPES: &[&str] = &["call", "put"];
pub const SCREENER_RANKINGS: &[&str] = &["volume", "change"];

const ORDER_ID: ParamSpec =
    ParamSpec::required("order_id", ParamKind::String, "The unique ID of the Alpaca order");
const POSITION_ID: ParamSpec = ParamSpec::required(
    "symbol_or_asset_id",
    ParamKind::String,
    "Either the ticker symbol (e.g. AAPL) or the Alpaca asset ID",
);
const CONTRACT_ID: ParamSpec = ParamSpec::required(
    "symbol_or_contract_id",
    ParamKind::String,
    "Either the option symbol (e.g. AAPL230616C00150000) or contract ID",
);
const WATCHLIST_ID: ParamSpec =
    ParamSpec::required("watchlist_id", ParamKind::String, "The unique ID of the watchlist");
const SYMBOLS: ParamSpec = ParamSpec::required(
    "symbols",
    ParamKind::String,
    "Comma-separated symbols (e.g. 'AAPL,TSLA')",
);
const SCREENER_BY: ParamSpec = ParamSpec::required(
    "by",
    ParamKind::Enum(SCREENER_RANKINGS),
    "Sort by 'volume' or 'change'",
);
const SCREENER_TOP: ParamSpec = ParamSpec::required(
    "top",
    ParamKind::Integer { min: 1, max: 100 },
    "Number of top stocks to fetch",
);

const CREATE_ORDER: &[ParamSpec] = &[
    ParamSpec::required("symbol", ParamKind::String, "Ticker symbol, e.g. AAPL"),
    ParamSpec::required("qty", ParamKind::Number, "Number of shares"),
    ParamSpec::required("side", ParamKind::Enum(ORDER_SIDES), "Buy or sell"),
    ParamSpec::required("type", ParamKind::Enum(ORDER_TYPES), "Order type"),
    ParamSpec::required("time_in_force", ParamKind::Enum(TIME_IN_FORCE), "Time in force"),
    ParamSpec::optional(
        "limit_price",
        ParamKind::Number,
        "Limit price; only sent when type is limit",
    ),
];
const GET_ORDERS: &[ParamSpec] = &[
    ParamSpec::optional(
        "status",
        ParamKind::Enum(ORDER_STATUSES),
        "Filter by order status (open, closed, or all)",
    ),
    ParamSpec::optional(
        "limit",
        ParamKind::Integer { min: 1, max: 1000 },
        "Max number of orders to retrieve",
    ),
    ParamSpec::optional(
        "direction",
        ParamKind::Enum(SORT_DIRECTIONS),
        "Sort direction: ascending or descending",
    ),
];
const REPLACE_ORDER: &[ParamSpec] = &[
    ORDER_ID,
    ParamSpec::optional("qty", ParamKind::Number, "New quantity of shares"),
    ParamSpec::optional(
        "limit_price",
        ParamKind::Number,
        "New limit price, required for updating a limit order",
    ),
];
const CREATE_WATCHLIST: &[ParamSpec] = &[
    ParamSpec::required("name", ParamKind::String, "Name for the new watchlist"),
    ParamSpec::required(
        "symbols",
        ParamKind::StringArray,
        "Array of ticker symbols to include",
    ),
];
const UPDATE_WATCHLIST: &[ParamSpec] = &[
    WATCHLIST_ID,
    ParamSpec::required("name", ParamKind::String, "New name for the watchlist"),
    ParamSpec::required("symbols", ParamKind::StringArray, "Updated array of ticker symbols"),
];
const PORTFOLIO_HISTORY: &[ParamSpec] = &[
    ParamSpec::required(
        "period",
        ParamKind::String,
        "History period (e.g. '1D', '1W', '1M', '1Y', 'ALL')",
    ),
    ParamSpec::required(
        "timeframe",
        ParamKind::String,
        "Timeframe for granularity (e.g. '1Min', '5Min', '1D')",
    ),
    ParamSpec::optional("date_end", ParamKind::String, "ISO date to end the history"),
    ParamSpec::optional("extended_hours", ParamKind::Boolean, "Include extended-hours data"),
];
const ACTIVITY: &[ParamSpec] = &[ParamSpec::required(
    "activity_type",
    ParamKind::String,
    "Type of activity (e.g. 'FILL', 'ORDER_CANCEL')",
)];
const OPTIONS_CONTRACTS: &[ParamSpec] = &[
    ParamSpec::required(
        "symbol_or_contract_id",
        ParamKind::String,
        "Underlying symbol or exact contract ID",
    ),
    ParamSpec::optional("expiration_date", ParamKind::String, "YYYY-MM-DD expiration filter"),
    ParamSpec::optional("strike_price", ParamKind::Number, "Filter by strike price"),
    ParamSpec::optional(
        "option_type",
        ParamKind::Enum(OPTION_TYPES),
        "Filter by 'call' or 'put'",
    ),
];
const CORPORATE_ACTION: &[ParamSpec] =
    &[ParamSpec::required("id", ParamKind::String, "ID of the corporate action")];
const CORPORATE_ACTIONS: &[ParamSpec] = &[
    ParamSpec::required(
        "ca_types",
        ParamKind::String,
        "Comma-separated action types (e.g. 'MERGER,CASH_DIVIDEND')",
    ),
    ParamSpec::required("since", ParamKind::String, "Start date (YYYY-MM-DD) for filtering"),
    ParamSpec::required("until", ParamKind::String, "End date (YYYY-MM-DD) for filtering"),
];
const STOCKS_CORPORATE_ACTIONS: &[ParamSpec] = &[
    SYMBOLS,
    ParamSpec::required(
        "types",
        ParamKind::String,
        "Comma-separated action types (e.g. 'cash_dividends')",
    ),
];
const NEWS: &[ParamSpec] = &[
    SYMBOLS,
    ParamSpec::optional(
        "limit",
        ParamKind::Integer { min: 1, max: 100 },
        "Max number of articles",
    ),
];
const SCREENER: &[ParamSpec] = &[SCREENER_BY, SCREENER_TOP];
const QUOTES: &[ParamSpec] = &[
    SYMBOLS,
    ParamSpec::optional(
        "limit",
        ParamKind::Integer { min: 1, max: 500 },
        "Max number of quotes",
    ),
];
const TRADES: &[ParamSpec] = &[
    SYMBOLS,
    ParamSpec::optional(
        "limit",
        ParamKind::Integer { min: 1, max: 500 },
        "Max number of trades",
    ),
];
const CONDITIONS: &[ParamSpec] = &[
    ParamSpec::required(
        "tickType",
        ParamKind::String,
        "Type of tick (e.g. 'trade', 'quote')",
    ),
    ParamSpec::required("tape", ParamKind::String, "Tape identifier (e.g. 'A', 'B', 'C')"),
];

const fn tool(
    name: &'static str,
    description: &'static str,
    params: &'static [ParamSpec],
    handler: ToolHandler,
) -> ToolDefinition {
    ToolDefinition {
        name,
        description,
        schema: ToolSchema::new(params),
        handler,
    }
}

/// Get all available tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        // Account
        tool("alpaca-getAccount", "Fetches your Alpaca account", &[], handlers::get_account),
        tool(
            "alpaca-getPortfolioHistory",
            "Fetches the equity and profit/loss history of the account",
            PORTFOLIO_HISTORY,
            handlers::get_portfolio_history,
        ),
        tool(
            "alpaca-getActivity",
            "Fetches account activities of a single type",
            ACTIVITY,
            handlers::get_activity,
        ),
        tool(
            "alpaca-getActivities",
            "Fetches all account activities",
            &[],
            handlers::get_activities,
        ),
        // Orders
        tool(
            "alpaca-createOrder",
            "Places a new order",
            CREATE_ORDER,
            handlers::create_order,
        ),
        tool(
            "alpaca-getOrder",
            "Fetches a single order by ID",
            &[ORDER_ID],
            handlers::get_order,
        ),
        tool(
            "alpaca-getOrders",
            "Retrieves a list of your Alpaca orders",
            GET_ORDERS,
            handlers::get_orders,
        ),
        tool(
            "alpaca-replaceOrder",
            "Replaces the quantity or limit price of an open order",
            REPLACE_ORDER,
            handlers::replace_order,
        ),
        tool(
            "alpaca-cancelOrder",
            "Cancels a single open order",
            &[ORDER_ID],
            handlers::cancel_order,
        ),
        tool(
            "alpaca-cancelOrders",
            "Cancels all open orders",
            &[],
            handlers::cancel_orders,
        ),
        // Positions & options
        tool(
            "alpaca-getPosition",
            "Fetches an open position",
            &[POSITION_ID],
            handlers::get_position,
        ),
        tool(
            "alpaca-getPositions",
            "Fetches all open positions",
            &[],
            handlers::get_positions,
        ),
        tool(
            "alpaca-closePosition",
            "Liquidates an open position",
            &[POSITION_ID],
            handlers::close_position,
        ),
        tool(
            "alpaca-closePositions",
            "Liquidates all open positions",
            &[],
            handlers::close_positions,
        ),
        tool(
            "alpaca-exerciseOption",
            "Exercises a held options contract",
            &[CONTRACT_ID],
            handlers::exercise_option,
        ),
        tool(
            "alpaca-getOptionsContract",
            "Fetches a single options contract",
            &[CONTRACT_ID],
            handlers::get_options_contract,
        ),
        tool(
            "alpaca-getOptionsContracts",
            "Searches options contracts for an underlying symbol",
            OPTIONS_CONTRACTS,
            handlers::get_options_contracts,
        ),
        // Watchlists
        tool(
            "alpaca-getWatchlist",
            "Fetches a watchlist by ID",
            &[WATCHLIST_ID],
            handlers::get_watchlist,
        ),
        tool(
            "alpaca-getWatchlists",
            "Fetches all watchlists",
            &[],
            handlers::get_watchlists,
        ),
        tool(
            "alpaca-createWatchlist",
            "Creates a new watchlist",
            CREATE_WATCHLIST,
            handlers::create_watchlist,
        ),
        tool(
            "alpaca-updateWatchlist",
            "Renames a watchlist and replaces its symbols",
            UPDATE_WATCHLIST,
            handlers::update_watchlist,
        ),
        tool(
            "alpaca-deleteWatchlist",
            "Deletes a watchlist",
            &[WATCHLIST_ID],
            handlers::delete_watchlist,
        ),
        // Corporate actions
        tool(
            "alpaca-getCorporateAction",
            "Fetches a corporate action announcement",
            CORPORATE_ACTION,
            handlers::get_corporate_action,
        ),
        tool(
            "alpaca-getCorporateActions",
            "Fetches corporate action announcements in a date range",
            CORPORATE_ACTIONS,
            handlers::get_corporate_actions,
        ),
        tool(
            "alpaca-getStocksCorporateActions",
            "Fetches corporate actions for stock symbols",
            STOCKS_CORPORATE_ACTIONS,
            handlers::get_stocks_corporate_actions,
        ),
        // News & screener
        tool(
            "alpaca-getNews",
            "Fetches news articles for symbols",
            NEWS,
            handlers::get_news,
        ),
        tool(
            "alpaca-getStocksMostActives",
            "Fetches the most active stocks",
            SCREENER,
            handlers::get_stocks_most_actives,
        ),
        tool(
            "alpaca-getStocksMarketMovers",
            "Fetches the top market movers",
            SCREENER,
            handlers::get_stocks_market_movers,
        ),
        // Market data
        tool(
            "alpaca-getStocksQuotes",
            "Fetches historical quotes",
            QUOTES,
            handlers::get_stocks_quotes,
        ),
        tool(
            "alpaca-getStocksQuotesLatest",
            "Fetches the latest quotes",
            &[SYMBOLS],
            handlers::get_stocks_quotes_latest,
        ),
        tool(
            "alpaca-getStocksSnapshots",
            "Fetches market snapshots",
            &[SYMBOLS],
            handlers::get_stocks_snapshots,
        ),
        tool(
            "alpaca-getStocksConditions",
            "Fetches trade or quote condition codes",
            CONDITIONS,
            handlers::get_stocks_conditions,
        ),
        tool(
            "alpaca-getStocksExchangeCodes",
            "Fetches exchange codes",
            &[],
            handlers::get_stocks_exchange_codes,
        ),
        tool(
            "alpaca-getStocksTrades",
            "Fetches historical trades",
            TRADES,
            handlers::get_stocks_trades,
        ),
        tool(
            "alpaca-getStocksTradesLatest",
            "Fetches the latest trades",
            TRADES,
            handlers::get_stocks_trades_latest,
        ),
    ]
}

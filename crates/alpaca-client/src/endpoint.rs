//! Request model for the brokerage boundary
//!
//! Each [`Endpoint`] corresponds to exactly one Alpaca REST operation. The
//! route table below is the only place that knows HTTP methods and paths.

use reqwest::Method;
use serde_json::{Map, Value};

/// Which Alpaca API host serves an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBase {
    /// Trading API (account, orders, positions, watchlists, ...)
    Trading,
    /// Market data API (quotes, trades, news, screener, ...)
    Data,
}

/// HTTP method, host and path template for an endpoint.
///
/// Path templates use `{field}` placeholders that are filled from (and
/// removed from) the request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub base: ApiBase,
    pub path: &'static str,
}

impl Route {
    fn new(method: Method, base: ApiBase, path: &'static str) -> Self {
        Self { method, base, path }
    }

    /// Whether remaining payload fields travel in a JSON body rather than the query string
    pub fn sends_body(&self) -> bool {
        matches!(self.method, Method::POST | Method::PUT | Method::PATCH)
    }

    /// Names of the `{placeholder}` segments in the path template, in order
    pub fn path_params(&self) -> impl Iterator<Item = &'static str> {
        self.path.split('/').filter_map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
        })
    }
}

/// Every remote operation the server can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    // Account
    GetAccount,
    GetPortfolioHistory,
    GetActivity,
    GetActivities,

    // Orders
    CreateOrder,
    GetOrder,
    GetOrders,
    ReplaceOrder,
    CancelOrder,
    CancelOrders,

    // Positions & options
    GetPosition,
    GetPositions,
    ClosePosition,
    ClosePositions,
    ExerciseOption,
    GetOptionsContract,
    GetOptionsContracts,

    // Watchlists
    GetWatchlist,
    GetWatchlists,
    CreateWatchlist,
    UpdateWatchlist,
    DeleteWatchlist,

    // Corporate actions
    GetCorporateAction,
    GetCorporateActions,
    GetStocksCorporateActions,

    // News & screener
    GetNews,
    GetStocksMostActives,
    GetStocksMarketMovers,

    // Market data
    GetStocksQuotes,
    GetStocksQuotesLatest,
    GetStocksSnapshots,
    GetStocksConditions,
    GetStocksExchangeCodes,
    GetStocksTrades,
    GetStocksTradesLatest,
}

impl Endpoint {
    /// Route table
    pub fn route(self) -> Route {
        use ApiBase::{Data, Trading};

        match self {
            Self::GetAccount => Route::new(Method::GET, Trading, "/v2/account"),
            Self::GetPortfolioHistory => {
                Route::new(Method::GET, Trading, "/v2/account/portfolio/history")
            }
            Self::GetActivity => Route::new(
                Method::GET,
                Trading,
                "/v2/account/activities/{activity_type}",
            ),
            Self::GetActivities => Route::new(Method::GET, Trading, "/v2/account/activities"),

            Self::CreateOrder => Route::new(Method::POST, Trading, "/v2/orders"),
            Self::GetOrder => Route::new(Method::GET, Trading, "/v2/orders/{order_id}"),
            Self::GetOrders => Route::new(Method::GET, Trading, "/v2/orders"),
            Self::ReplaceOrder => Route::new(Method::PATCH, Trading, "/v2/orders/{order_id}"),
            Self::CancelOrder => Route::new(Method::DELETE, Trading, "/v2/orders/{order_id}"),
            Self::CancelOrders => Route::new(Method::DELETE, Trading, "/v2/orders"),

            Self::GetPosition => Route::new(
                Method::GET,
                Trading,
                "/v2/positions/{symbol_or_asset_id}",
            ),
            Self::GetPositions => Route::new(Method::GET, Trading, "/v2/positions"),
            Self::ClosePosition => Route::new(
                Method::DELETE,
                Trading,
                "/v2/positions/{symbol_or_asset_id}",
            ),
            Self::ClosePositions => Route::new(Method::DELETE, Trading, "/v2/positions"),
            Self::ExerciseOption => Route::new(
                Method::POST,
                Trading,
                "/v2/positions/{symbol_or_contract_id}/exercise",
            ),
            Self::GetOptionsContract => Route::new(
                Method::GET,
                Trading,
                "/v2/options/contracts/{symbol_or_contract_id}",
            ),
            Self::GetOptionsContracts => {
                Route::new(Method::GET, Trading, "/v2/options/contracts")
            }

            Self::GetWatchlist => {
                Route::new(Method::GET, Trading, "/v2/watchlists/{watchlist_id}")
            }
            Self::GetWatchlists => Route::new(Method::GET, Trading, "/v2/watchlists"),
            Self::CreateWatchlist => Route::new(Method::POST, Trading, "/v2/watchlists"),
            Self::UpdateWatchlist => {
                Route::new(Method::PUT, Trading, "/v2/watchlists/{watchlist_id}")
            }
            Self::DeleteWatchlist => {
                Route::new(Method::DELETE, Trading, "/v2/watchlists/{watchlist_id}")
            }

            Self::GetCorporateAction => Route::new(
                Method::GET,
                Trading,
                "/v2/corporate_actions/announcements/{id}",
            ),
            Self::GetCorporateActions => Route::new(
                Method::GET,
                Trading,
                "/v2/corporate_actions/announcements",
            ),
            Self::GetStocksCorporateActions => {
                Route::new(Method::GET, Data, "/v1/corporate-actions")
            }

            Self::GetNews => Route::new(Method::GET, Data, "/v1beta1/news"),
            Self::GetStocksMostActives => Route::new(
                Method::GET,
                Data,
                "/v1beta1/screener/stocks/most-actives",
            ),
            Self::GetStocksMarketMovers => {
                Route::new(Method::GET, Data, "/v1beta1/screener/stocks/movers")
            }

            Self::GetStocksQuotes => Route::new(Method::GET, Data, "/v2/stocks/quotes"),
            Self::GetStocksQuotesLatest => {
                Route::new(Method::GET, Data, "/v2/stocks/quotes/latest")
            }
            Self::GetStocksSnapshots => Route::new(Method::GET, Data, "/v2/stocks/snapshots"),
            Self::GetStocksConditions => Route::new(
                Method::GET,
                Data,
                "/v2/stocks/meta/conditions/{tickType}",
            ),
            Self::GetStocksExchangeCodes => {
                Route::new(Method::GET, Data, "/v2/stocks/meta/exchanges")
            }
            Self::GetStocksTrades => Route::new(Method::GET, Data, "/v2/stocks/trades"),
            Self::GetStocksTradesLatest => {
                Route::new(Method::GET, Data, "/v2/stocks/trades/latest")
            }
        }
    }

    /// Translate tool-level field names into the names the REST API expects.
    ///
    /// Most endpoints take fields verbatim. The options contract search
    /// filters by underlying symbol and a strike range, so a single strike
    /// becomes an inclusive range of width zero.
    pub fn wire_params(self, mut payload: Map<String, Value>) -> Map<String, Value> {
        if self == Self::GetOptionsContracts {
            if let Some(symbol) = payload.remove("symbol_or_contract_id") {
                payload.insert("underlying_symbols".to_string(), symbol);
            }
            if let Some(strike) = payload.remove("strike_price") {
                payload.insert("strike_price_gte".to_string(), strike.clone());
                payload.insert("strike_price_lte".to_string(), strike);
            }
            if let Some(kind) = payload.remove("option_type") {
                payload.insert("type".to_string(), kind);
            }
        }
        payload
    }
}

/// One call into the brokerage: an endpoint and the fields to send with it
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerRequest {
    pub endpoint: Endpoint,
    pub payload: Map<String, Value>,
}

impl BrokerRequest {
    /// A request with no fields
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            payload: Map::new(),
        }
    }

    /// A request carrying the given fields
    pub fn with_payload(endpoint: Endpoint, payload: Map<String, Value>) -> Self {
        Self { endpoint, payload }
    }
}

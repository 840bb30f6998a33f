//! MCP Tool Handlers
//!
//! Each handler receives arguments that already passed its tool's schema,
//! performs exactly one brokerage call through the [`ToolContext`], and
//! shapes the response into a [`ToolResult`]. Remote failures are returned
//! as errors; the registry turns them into error-shaped results.

use alpaca_client::Endpoint;
use serde_json::{Map, Value};

use crate::schema::ValidatedArgs;
use crate::shape::{Payload, counted, display, entity, first_present, with_summary};
use crate::tools::{HandlerFuture, ToolContext};

// ============================================================================
// Account Handlers
// ============================================================================

pub fn get_account(ctx: &ToolContext, _args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let account = ctx.execute(Endpoint::GetAccount, Map::new()).await?;
        Ok(entity(&account))
    })
}

pub fn get_portfolio_history(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("period")?
            .field("timeframe")?
            .optional("date_end")
            .optional("extended_hours")
            .build();
        let history = ctx.execute(Endpoint::GetPortfolioHistory, payload).await?;
        Ok(entity(&history))
    })
}

pub fn get_activity(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("activity_type")?.build();
        let activity = ctx.execute(Endpoint::GetActivity, payload).await?;
        Ok(entity(&activity))
    })
}

pub fn get_activities(ctx: &ToolContext, _args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let activities = ctx.execute(Endpoint::GetActivities, Map::new()).await?;
        Ok(counted(activities, |n| format!("Fetched {n} activity record(s).")))
    })
}

// ============================================================================
// Order Handlers
// ============================================================================

/// Price shown in order summaries: the fill price, else the limit price
fn order_price(order: &Value) -> String {
    first_present(order, &["filled_avg_price", "limit_price"])
        .map(display)
        .unwrap_or_else(|| "market".to_string())
}

/// A field of the returned order, falling back to what was sent
fn order_field(order: &Value, key: &str, sent: Option<&Value>) -> String {
    first_present(order, &[key])
        .or(sent)
        .map(display)
        .unwrap_or_default()
}

pub fn create_order(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let symbol = args.str("symbol")?.to_uppercase();
        let is_limit = args.opt_str("type") == Some("limit");

        let payload = Payload::from_args(&args)
            .set("symbol", symbol)
            .field("qty")?
            .field("side")?
            .field("type")?
            .field("time_in_force")?
            .optional_if("limit_price", is_limit)
            .build();

        let order = ctx.execute(Endpoint::CreateOrder, payload.clone()).await?;

        let summary = format!(
            "Order placed! {} {} {} @ {}",
            order_field(&order, "side", payload.get("side")).to_uppercase(),
            order_field(&order, "qty", payload.get("qty")),
            order_field(&order, "symbol", payload.get("symbol")),
            order_price(&order),
        );
        Ok(with_summary(summary, &order))
    })
}

pub fn get_order(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("order_id")?.build();
        let order = ctx.execute(Endpoint::GetOrder, payload).await?;
        Ok(entity(&order))
    })
}

pub fn get_orders(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .optional("status")
            .optional("limit")
            .optional("direction")
            .build();
        let orders = ctx.execute(Endpoint::GetOrders, payload).await?;
        Ok(counted(orders, |n| format!("Fetched {n} order(s).")))
    })
}

pub fn replace_order(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("order_id")?
            .optional("qty")
            .optional("limit_price")
            .build();

        let replaced = ctx.execute(Endpoint::ReplaceOrder, payload.clone()).await?;

        let summary = format!(
            "Replaced order {} - {} {} @ {}",
            order_field(&replaced, "id", payload.get("order_id")),
            order_field(&replaced, "side", None).to_uppercase(),
            order_field(&replaced, "qty", payload.get("qty")),
            order_price(&replaced),
        );
        Ok(with_summary(summary, &replaced))
    })
}

pub fn cancel_order(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("order_id")?.build();
        let canceled = ctx.execute(Endpoint::CancelOrder, payload.clone()).await?;

        // A successful cancel may come back with an empty body
        let id = order_field(&canceled, "id", payload.get("order_id"));
        Ok(with_summary(format!("Order {id} canceled successfully."), &canceled))
    })
}

pub fn cancel_orders(ctx: &ToolContext, _args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let canceled = ctx.execute(Endpoint::CancelOrders, Map::new()).await?;
        Ok(counted(canceled, |n| format!("Canceled {n} order(s).")))
    })
}

// ============================================================================
// Position & Options Handlers
// ============================================================================

pub fn get_position(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("symbol_or_asset_id")?.build();
        let position = ctx.execute(Endpoint::GetPosition, payload).await?;
        Ok(entity(&position))
    })
}

pub fn get_positions(ctx: &ToolContext, _args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let positions = ctx.execute(Endpoint::GetPositions, Map::new()).await?;
        Ok(counted(positions, |n| format!("Fetched {n} position(s).")))
    })
}

pub fn close_position(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let target = args.str("symbol_or_asset_id")?.to_string();
        let payload = Payload::from_args(&args).field("symbol_or_asset_id")?.build();
        let closed = ctx.execute(Endpoint::ClosePosition, payload).await?;
        Ok(with_summary(format!("Closed position for {target}."), &closed))
    })
}

pub fn close_positions(ctx: &ToolContext, _args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let closed = ctx.execute(Endpoint::ClosePositions, Map::new()).await?;
        Ok(counted(closed, |n| format!("Closed {n} position(s).")))
    })
}

pub fn exercise_option(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("symbol_or_contract_id")?
            .build();
        let result = ctx.execute(Endpoint::ExerciseOption, payload).await?;
        Ok(entity(&result))
    })
}

pub fn get_options_contract(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("symbol_or_contract_id")?
            .build();
        let contract = ctx.execute(Endpoint::GetOptionsContract, payload).await?;
        Ok(entity(&contract))
    })
}

pub fn get_options_contracts(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("symbol_or_contract_id")?
            .optional("expiration_date")
            .optional("strike_price")
            .optional("option_type")
            .build();
        let contracts = ctx.execute(Endpoint::GetOptionsContracts, payload).await?;
        Ok(counted(contracts, |n| format!("Found {n} contract(s).")))
    })
}

// ============================================================================
// Watchlist Handlers
// ============================================================================

pub fn get_watchlist(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("watchlist_id")?.build();
        let watchlist = ctx.execute(Endpoint::GetWatchlist, payload).await?;
        Ok(entity(&watchlist))
    })
}

pub fn get_watchlists(ctx: &ToolContext, _args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let watchlists = ctx.execute(Endpoint::GetWatchlists, Map::new()).await?;
        Ok(counted(watchlists, |n| format!("Fetched {n} watchlist(s).")))
    })
}

pub fn create_watchlist(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("name")?
            .field("symbols")?
            .build();
        let created = ctx.execute(Endpoint::CreateWatchlist, payload).await?;
        Ok(entity(&created))
    })
}

pub fn update_watchlist(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("watchlist_id")?
            .field("name")?
            .field("symbols")?
            .build();
        let updated = ctx.execute(Endpoint::UpdateWatchlist, payload).await?;
        Ok(entity(&updated))
    })
}

pub fn delete_watchlist(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("watchlist_id")?.build();
        let deleted = ctx.execute(Endpoint::DeleteWatchlist, payload).await?;
        Ok(entity(&deleted))
    })
}

// ============================================================================
// Corporate Action Handlers
// ============================================================================

pub fn get_corporate_action(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("id")?.build();
        let action = ctx.execute(Endpoint::GetCorporateAction, payload).await?;
        Ok(entity(&action))
    })
}

pub fn get_corporate_actions(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("ca_types")?
            .field("since")?
            .field("until")?
            .build();
        let actions = ctx.execute(Endpoint::GetCorporateActions, payload).await?;
        Ok(counted(actions, |n| format!("Found {n} corporate action(s).")))
    })
}

pub fn get_stocks_corporate_actions(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("symbols")?
            .field("types")?
            .build();
        let actions = ctx.execute(Endpoint::GetStocksCorporateActions, payload).await?;
        Ok(counted(actions, |n| {
            format!("Found {n} stock corporate action(s).")
        }))
    })
}

// ============================================================================
// News & Screener Handlers
// ============================================================================

pub fn get_news(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("symbols")?
            .optional("limit")
            .build();
        let news = ctx.execute(Endpoint::GetNews, payload).await?;
        Ok(counted(news, |n| format!("Fetched {n} article(s).")))
    })
}

pub fn get_stocks_most_actives(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("by")?.field("top")?.build();
        let actives = ctx.execute(Endpoint::GetStocksMostActives, payload).await?;
        Ok(counted(actives, |n| format!("Top {n} most active stocks.")))
    })
}

pub fn get_stocks_market_movers(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("by")?.field("top")?.build();
        let movers = ctx.execute(Endpoint::GetStocksMarketMovers, payload).await?;
        Ok(counted(movers, |n| format!("Top {n} market mover stocks.")))
    })
}

// ============================================================================
// Market Data Handlers
// ============================================================================

pub fn get_stocks_quotes(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("symbols")?
            .optional("limit")
            .build();
        let quotes = ctx.execute(Endpoint::GetStocksQuotes, payload).await?;
        Ok(counted(quotes, |n| format!("Fetched {n} quote(s).")))
    })
}

pub fn get_stocks_quotes_latest(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let symbols = args.str("symbols")?.to_string();
        let payload = Payload::from_args(&args).field("symbols")?.build();
        let quotes = ctx.execute(Endpoint::GetStocksQuotesLatest, payload).await?;
        Ok(counted(quotes, |n| {
            format!("Fetched {n} latest quote(s) for {symbols}.")
        }))
    })
}

pub fn get_stocks_snapshots(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args).field("symbols")?.build();
        let snapshots = ctx.execute(Endpoint::GetStocksSnapshots, payload).await?;
        Ok(counted(snapshots, |n| format!("Fetched {n} snapshot(s).")))
    })
}

pub fn get_stocks_conditions(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("tickType")?
            .field("tape")?
            .build();
        let conditions = ctx.execute(Endpoint::GetStocksConditions, payload).await?;
        Ok(counted(conditions, |n| format!("Fetched {n} condition(s).")))
    })
}

pub fn get_stocks_exchange_codes(ctx: &ToolContext, _args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let codes = ctx.execute(Endpoint::GetStocksExchangeCodes, Map::new()).await?;
        Ok(counted(codes, |n| format!("Fetched {n} exchange code(s).")))
    })
}

pub fn get_stocks_trades(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let payload = Payload::from_args(&args)
            .field("symbols")?
            .optional("limit")
            .build();
        let trades = ctx.execute(Endpoint::GetStocksTrades, payload).await?;
        Ok(counted(trades, |n| format!("Fetched {n} trade(s).")))
    })
}

pub fn get_stocks_trades_latest(ctx: &ToolContext, args: ValidatedArgs) -> HandlerFuture<'_> {
    Box::pin(async move {
        let symbols = args.str("symbols")?.to_string();
        let payload = Payload::from_args(&args)
            .field("symbols")?
            .optional("limit")
            .build();
        let trades = ctx.execute(Endpoint::GetStocksTradesLatest, payload).await?;
        Ok(counted(trades, |n| {
            format!("Fetched {n} latest trade(s) for {symbols}.")
        }))
    })
}

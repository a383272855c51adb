//! Wire-format models for the Binance-style spot API.
//!
//! Pure serde structs plus conversions into domain types. Numeric
//! fields arrive as strings and parse into `Decimal` losslessly.

use crate::domain::{
    Balance, CancelAck, Candlestick, OpenOrder, OrderAck, OrderStatus, OrderUpdate, Side,
    SymbolPrice, Ticker24h, TradingRules, UserStreamEvent,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

pub fn parse_side(s: &str) -> Option<Side> {
    match s {
        "BUY" => Some(Side::Buy),
        "SELL" => Some(Side::Sell),
        _ => None,
    }
}

pub fn parse_status(s: &str) -> Option<OrderStatus> {
    match s {
        "NEW" => Some(OrderStatus::New),
        "PARTIALLY_FILLED" => Some(OrderStatus::PartiallyFilled),
        "FILLED" => Some(OrderStatus::Filled),
        "CANCELED" => Some(OrderStatus::Canceled),
        "REJECTED" => Some(OrderStatus::Rejected),
        "EXPIRED" | "EXPIRED_IN_MATCH" => Some(OrderStatus::Expired),
        _ => None,
    }
}

fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

// =============================================================================
// Exchange info
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub status: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

/// Per-symbol constraint filters; unrecognized filter types are kept as
/// `Other` and ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    Price {
        #[serde(with = "rust_decimal::serde::str")]
        min_price: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        max_price: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        tick_size: Decimal,
    },
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        #[serde(with = "rust_decimal::serde::str")]
        min_qty: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        max_qty: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        step_size: Decimal,
    },
    #[serde(rename = "MIN_NOTIONAL", rename_all = "camelCase")]
    MinNotional {
        #[serde(with = "rust_decimal::serde::str")]
        min_notional: Decimal,
    },
    #[serde(rename = "NOTIONAL", rename_all = "camelCase")]
    Notional {
        #[serde(with = "rust_decimal::serde::str")]
        min_notional: Decimal,
    },
    #[serde(other)]
    Other,
}

impl SymbolInfo {
    pub fn into_rules(self) -> TradingRules {
        let mut rules = TradingRules {
            symbol: self.symbol,
            base_asset: self.base_asset,
            quote_asset: self.quote_asset,
            tradable: self.status == "TRADING",
            tick_size: Decimal::ZERO,
            step_size: Decimal::ZERO,
            min_notional: Decimal::ZERO,
            min_price: Decimal::ZERO,
            max_price: Decimal::ZERO,
            min_qty: Decimal::ZERO,
            max_qty: Decimal::ZERO,
        };
        for filter in self.filters {
            match filter {
                SymbolFilter::Price {
                    min_price,
                    max_price,
                    tick_size,
                } => {
                    rules.min_price = min_price;
                    rules.max_price = max_price;
                    rules.tick_size = tick_size;
                }
                SymbolFilter::LotSize {
                    min_qty,
                    max_qty,
                    step_size,
                } => {
                    rules.min_qty = min_qty;
                    rules.max_qty = max_qty;
                    rules.step_size = step_size;
                }
                SymbolFilter::MinNotional { min_notional }
                | SymbolFilter::Notional { min_notional } => {
                    rules.min_notional = min_notional;
                }
                SymbolFilter::Other => {}
            }
        }
        rules
    }
}

// =============================================================================
// Account
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    pub balances: Vec<WireBalance>,
}

#[derive(Debug, Deserialize)]
pub struct WireBalance {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub free: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub locked: Decimal,
}

impl From<WireBalance> for Balance {
    fn from(w: WireBalance) -> Self {
        Balance::new(w.asset, w.free, w.locked)
    }
}

// =============================================================================
// Market data
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PriceRow {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

impl From<PriceRow> for SymbolPrice {
    fn from(r: PriceRow) -> Self {
        SymbolPrice {
            symbol: r.symbol,
            price: r.price,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hResponse {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub bid_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ask_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub last_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_change_percent: Decimal,
}

impl From<Ticker24hResponse> for Ticker24h {
    fn from(r: Ticker24hResponse) -> Self {
        Ticker24h {
            symbol: r.symbol,
            bid_price: r.bid_price,
            ask_price: r.ask_price,
            last_price: r.last_price,
            price_change_pct: r.price_change_percent,
        }
    }
}

/// One kline row: a JSON array of mixed numbers and strings.
pub fn kline_to_candle(row: &[serde_json::Value]) -> Option<Candlestick> {
    let decimal_at = |i: usize| -> Option<Decimal> {
        row.get(i)?.as_str()?.parse().ok()
    };
    Some(Candlestick {
        open_time: millis_to_utc(row.first()?.as_i64()?),
        open: decimal_at(1)?,
        high: decimal_at(2)?,
        low: decimal_at(3)?,
        close: decimal_at(4)?,
        volume: decimal_at(5)?,
        close_time: millis_to_utc(row.get(6)?.as_i64()?),
    })
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderRow {
    pub symbol: String,
    pub order_id: u64,
    pub side: String,
    pub status: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub orig_qty: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub executed_qty: Decimal,
    pub time: i64,
}

impl OpenOrderRow {
    pub fn into_open_order(self) -> Option<OpenOrder> {
        Some(OpenOrder {
            order_id: self.order_id,
            symbol: self.symbol,
            side: parse_side(&self.side)?,
            status: parse_status(&self.status)?,
            price: self.price,
            original_qty: self.orig_qty,
            executed_qty: self.executed_qty,
            created_at: millis_to_utc(self.time),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAckResponse {
    pub symbol: String,
    pub order_id: u64,
    pub status: String,
}

impl OrderAckResponse {
    pub fn into_ack(self) -> Option<OrderAck> {
        Some(OrderAck {
            order_id: self.order_id,
            symbol: self.symbol,
            status: parse_status(&self.status)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAckResponse {
    pub symbol: String,
    pub order_id: u64,
}

impl From<CancelAckResponse> for CancelAck {
    fn from(r: CancelAckResponse) -> Self {
        CancelAck {
            order_id: r.order_id,
            symbol: r.symbol,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenKeyResponse {
    pub listen_key: String,
}

// =============================================================================
// Push events
// =============================================================================

/// User-data-stream payloads, tagged by event type.
#[derive(Debug, Deserialize)]
#[serde(tag = "e")]
pub enum WsEvent {
    #[serde(rename = "outboundAccountPosition")]
    AccountPosition {
        #[serde(rename = "B")]
        balances: Vec<WsBalance>,
    },
    #[serde(rename = "executionReport")]
    ExecutionReport(WsExecutionReport),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct WsBalance {
    #[serde(rename = "a")]
    pub asset: String,
    #[serde(rename = "f", with = "rust_decimal::serde::str")]
    pub free: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    pub locked: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WsExecutionReport {
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "S")]
    pub side: String,
    #[serde(rename = "X")]
    pub status: String,
    #[serde(rename = "i")]
    pub order_id: u64,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "z", with = "rust_decimal::serde::str")]
    pub cumulative_qty: Decimal,
    #[serde(rename = "Z", with = "rust_decimal::serde::str")]
    pub cumulative_quote: Decimal,
}

impl WsEvent {
    /// Convert into an engine event; unknown or unparsable payloads
    /// yield `None` and are skipped.
    pub fn into_stream_event(self) -> Option<UserStreamEvent> {
        match self {
            WsEvent::AccountPosition { balances } => Some(UserStreamEvent::AccountUpdate {
                balances: balances
                    .into_iter()
                    .map(|b| Balance::new(b.asset, b.free, b.locked))
                    .collect(),
            }),
            WsEvent::ExecutionReport(report) => {
                let side = parse_side(&report.side)?;
                let status = parse_status(&report.status)?;
                Some(UserStreamEvent::OrderUpdate(OrderUpdate {
                    order_id: report.order_id,
                    symbol: report.symbol,
                    side,
                    status,
                    price: report.price,
                    quantity: report.cumulative_qty,
                    cumulative_quote: report.cumulative_quote,
                    event_time: millis_to_utc(report.event_time),
                }))
            }
            WsEvent::Other => None,
        }
    }
}

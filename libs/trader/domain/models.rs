//! Shared value types for the trading engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Order primitives
// =============================================================================

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type. The engine only ever places limit orders for trading
/// cycles and market orders for fee-asset top-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
        }
    }
}

/// Time-in-force for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    GoodTillCanceled,
    ImmediateOrCancel,
    FillOrKill,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GoodTillCanceled => "GTC",
            TimeInForce::ImmediateOrCancel => "IOC",
            TimeInForce::FillOrKill => "FOK",
        }
    }
}

/// Exchange-side order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Whether the order is still resting on the book.
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::New | OrderStatus::PartiallyFilled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Balances
// =============================================================================

/// Per-asset balance. Both amounts are non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn new(asset: impl Into<String>, free: Decimal, locked: Decimal) -> Self {
        Self {
            asset: asset.into(),
            free,
            locked,
        }
    }

    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

/// Immutable view of all account balances at one point in time.
///
/// At most one entry per asset; replaced wholesale, never patched in
/// place by readers.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    balances: HashMap<String, Balance>,
    pub captured_at: DateTime<Utc>,
}

impl AccountSnapshot {
    pub fn new(balances: Vec<Balance>, captured_at: DateTime<Utc>) -> Self {
        let balances = balances
            .into_iter()
            .map(|b| (b.asset.clone(), b))
            .collect();
        Self {
            balances,
            captured_at,
        }
    }

    pub fn empty() -> Self {
        Self {
            balances: HashMap::new(),
            captured_at: Utc::now(),
        }
    }

    pub fn get(&self, asset: &str) -> Option<&Balance> {
        self.balances.get(asset)
    }

    pub fn balances(&self) -> impl Iterator<Item = &Balance> {
        self.balances.values()
    }

    /// Insert or overwrite a single asset entry. Only used while
    /// building the next snapshot generation, never on a shared one.
    pub fn upsert(&mut self, balance: Balance) {
        self.balances.insert(balance.asset.clone(), balance);
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// An order the engine intends to submit. Quantity and price must
/// already satisfy the symbol's trading rules when this is handed to
/// the exchange client (see `domain::quantize::validate`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    pub fn limit(symbol: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            price,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::GoodTillCanceled,
        }
    }

    /// Market order; `price` is kept at zero and ignored by the exchange.
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            price: Decimal::ZERO,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::GoodTillCanceled,
        }
    }

    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// An order resting on the exchange, as reported by the REST snapshot.
#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub order_id: u64,
    pub symbol: String,
    pub side: Side,
    pub status: OrderStatus,
    pub price: Decimal,
    pub original_qty: Decimal,
    pub executed_qty: Decimal,
    pub created_at: DateTime<Utc>,
}

impl OpenOrder {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }
}

/// Acknowledgement of a placed order.
#[derive(Debug, Clone)]
pub struct OrderAck {
    pub order_id: u64,
    pub symbol: String,
    pub status: OrderStatus,
}

/// Acknowledgement of a cancellation.
#[derive(Debug, Clone)]
pub struct CancelAck {
    pub order_id: u64,
    pub symbol: String,
}

// =============================================================================
// Market data
// =============================================================================

/// Latest traded price of one symbol.
#[derive(Debug, Clone)]
pub struct SymbolPrice {
    pub symbol: String,
    pub price: Decimal,
}

/// 24h ticker extract; only the fields the engine consumes.
#[derive(Debug, Clone)]
pub struct Ticker24h {
    pub symbol: String,
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub last_price: Decimal,
    pub price_change_pct: Decimal,
}

/// Candle interval supported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl CandleInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::OneDay => "1d",
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        match self {
            CandleInterval::OneMinute => chrono::Duration::minutes(1),
            CandleInterval::FiveMinutes => chrono::Duration::minutes(5),
            CandleInterval::FifteenMinutes => chrono::Duration::minutes(15),
            CandleInterval::OneHour => chrono::Duration::hours(1),
            CandleInterval::FourHours => chrono::Duration::hours(4),
            CandleInterval::OneDay => chrono::Duration::days(1),
        }
    }
}

/// One OHLCV candle.
#[derive(Debug, Clone)]
pub struct Candlestick {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
}

// =============================================================================
// Push events
// =============================================================================

/// Order state change pushed over the user data stream.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub order_id: u64,
    pub symbol: String,
    pub side: Side,
    pub status: OrderStatus,
    /// Order (limit) price.
    pub price: Decimal,
    /// Cumulative filled base quantity.
    pub quantity: Decimal,
    /// Cumulative quote proceeds of the fills so far.
    pub cumulative_quote: Decimal,
    pub event_time: DateTime<Utc>,
}

/// Events delivered by the exchange's push connection, in arrival order.
#[derive(Debug, Clone)]
pub enum UserStreamEvent {
    /// Incremental balance deltas; only the listed assets changed.
    AccountUpdate { balances: Vec<Balance> },
    /// Order lifecycle notification (fills included).
    OrderUpdate(OrderUpdate),
}

//! Domain Layer
//!
//! Pure types and pure decision logic: no I/O, no clocks, no locks.
//! Everything here is deterministic and unit-testable in isolation.

pub mod allocation;
pub mod models;
pub mod quantize;
pub mod rules;
pub mod volatility;

pub use allocation::{split_buy_budget, split_sell_budget, BuyCandidate};
pub use models::{
    AccountSnapshot, Balance, CancelAck, Candlestick, CandleInterval, OpenOrder, OrderAck,
    OrderRequest, OrderStatus, OrderType, OrderUpdate, Side, SymbolPrice, Ticker24h,
    TimeInForce, UserStreamEvent,
};
pub use quantize::{min_qty_for_notional, snap_price_down, snap_qty_down, validate, RejectReason};
pub use rules::{RulesSnapshot, TradingRules};
pub use volatility::{dispersion, VolatilityTable};

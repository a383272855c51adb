//! Unattended spot cycle-trading engine.
//!
//! Continuously places, cancels, and reconciles limit orders against a
//! remote exchange, funding new buy/sell cycles from account balances
//! and exchange-published trading rules.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

// Re-export commonly used items
pub use application::Engine;
pub use domain::{
    split_buy_budget, split_sell_budget, AccountSnapshot, Balance, BuyCandidate, OrderRequest,
    RulesSnapshot, Side, TradingRules, UserStreamEvent, VolatilityTable,
};
pub use infrastructure::{
    init_tracing, AccountState, BinanceClient, EngineConfig, ExchangeClient, ExchangeError,
    RulesCache, StreamSession,
};
pub use utils::ShutdownManager;

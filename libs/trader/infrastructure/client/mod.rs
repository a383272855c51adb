//! Exchange client abstraction.
//!
//! The engine talks to the exchange exclusively through the
//! [`ExchangeClient`] trait; the concrete REST/WebSocket transport
//! lives in [`binance`]. Tests substitute a scripted implementation.

pub mod binance;

use crate::domain::{
    AccountSnapshot, CancelAck, Candlestick, CandleInterval, OpenOrder, OrderAck, OrderRequest,
    RulesSnapshot, SymbolPrice, Ticker24h, UserStreamEvent,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

pub use binance::BinanceClient;

/// Transport or exchange-side failure.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    /// The exchange refused the request; `code` is its numeric error
    /// code (insufficient balance, unknown order, invalid request, …).
    #[error("exchange rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Asynchronous exchange collaborator. Every call may fail with an
/// [`ExchangeError`]; the engine decides whether and when to retry.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Full account balance snapshot.
    async fn account_info(&self) -> ExchangeResult<AccountSnapshot>;

    /// All symbols' trading rules.
    async fn trading_rules(&self) -> ExchangeResult<RulesSnapshot>;

    /// Latest price for every symbol.
    async fn all_prices(&self) -> ExchangeResult<Vec<SymbolPrice>>;

    /// 24h ticker for one symbol.
    async fn ticker_24h(&self, symbol: &str) -> ExchangeResult<Ticker24h>;

    /// All currently open orders across symbols.
    async fn open_orders(&self) -> ExchangeResult<Vec<OpenOrder>>;

    /// Submit an order. The request must already satisfy the symbol's
    /// trading rules.
    async fn place_order(&self, request: &OrderRequest) -> ExchangeResult<OrderAck>;

    /// Cancel a resting order.
    async fn cancel_order(&self, symbol: &str, order_id: u64) -> ExchangeResult<CancelAck>;

    /// Historical candles for one symbol over `[start, end]`.
    async fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ExchangeResult<Vec<Candlestick>>;

    /// Acquire a user-data-stream session token.
    async fn start_user_stream(&self) -> ExchangeResult<String>;

    /// Extend the lifetime of a session token.
    async fn keepalive_user_stream(&self, listen_key: &str) -> ExchangeResult<()>;

    /// Release a session token.
    async fn close_user_stream(&self, listen_key: &str) -> ExchangeResult<()>;

    /// Open the push connection for `listen_key` and forward parsed
    /// events into `events` in arrival order. Returns the handle of the
    /// spawned listener task; the task exits on connection loss and the
    /// caller's watchdog is responsible for reconnecting.
    async fn listen_user_stream(
        &self,
        listen_key: &str,
        events: UnboundedSender<UserStreamEvent>,
    ) -> ExchangeResult<JoinHandle<()>>;
}

//! Binance-style spot exchange transport.
//!
//! Thin glue implementing [`ExchangeClient`]: a signed REST client plus
//! a user-data-stream WebSocket listener. No engine logic lives here.

mod rest;
mod types;
mod ws;

use crate::domain::{
    AccountSnapshot, CancelAck, Candlestick, CandleInterval, OpenOrder, OrderAck, OrderRequest,
    RulesSnapshot, SymbolPrice, Ticker24h, UserStreamEvent,
};
use crate::infrastructure::client::{ExchangeClient, ExchangeResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rest::RestClient;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Concrete exchange client for a Binance-style spot API.
pub struct BinanceClient {
    rest: RestClient,
    ws_url: String,
}

impl BinanceClient {
    pub fn new(
        rest_url: impl Into<String>,
        ws_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            rest: RestClient::new(rest_url, api_key, api_secret),
            ws_url: ws_url.into(),
        }
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn account_info(&self) -> ExchangeResult<AccountSnapshot> {
        self.rest.account().await
    }

    async fn trading_rules(&self) -> ExchangeResult<RulesSnapshot> {
        self.rest.exchange_info().await
    }

    async fn all_prices(&self) -> ExchangeResult<Vec<SymbolPrice>> {
        self.rest.prices().await
    }

    async fn ticker_24h(&self, symbol: &str) -> ExchangeResult<Ticker24h> {
        self.rest.ticker_24h(symbol).await
    }

    async fn open_orders(&self) -> ExchangeResult<Vec<OpenOrder>> {
        self.rest.open_orders().await
    }

    async fn place_order(&self, request: &OrderRequest) -> ExchangeResult<OrderAck> {
        self.rest.place_order(request).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> ExchangeResult<CancelAck> {
        self.rest.cancel_order(symbol, order_id).await
    }

    async fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ExchangeResult<Vec<Candlestick>> {
        self.rest.klines(symbol, interval, start, end).await
    }

    async fn start_user_stream(&self) -> ExchangeResult<String> {
        self.rest.create_listen_key().await
    }

    async fn keepalive_user_stream(&self, listen_key: &str) -> ExchangeResult<()> {
        self.rest.keepalive_listen_key(listen_key).await
    }

    async fn close_user_stream(&self, listen_key: &str) -> ExchangeResult<()> {
        self.rest.close_listen_key(listen_key).await
    }

    async fn listen_user_stream(
        &self,
        listen_key: &str,
        events: UnboundedSender<UserStreamEvent>,
    ) -> ExchangeResult<JoinHandle<()>> {
        ws::connect_and_listen(&self.ws_url, listen_key, events).await
    }
}

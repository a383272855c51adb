//! Scripted in-memory exchange for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use trader::domain::{
    AccountSnapshot, Balance, CancelAck, Candlestick, CandleInterval, OpenOrder, OrderAck,
    OrderRequest, OrderStatus, RulesSnapshot, SymbolPrice, Ticker24h, TradingRules,
    UserStreamEvent,
};
use trader::infrastructure::client::{ExchangeClient, ExchangeError, ExchangeResult};
use trader::infrastructure::EngineConfig;
use trader::utils::ShutdownManager;
use trader::Engine;

/// Scripted exchange double. Every response is pre-seeded; every
/// mutation is recorded for assertions.
pub struct MockExchange {
    pub rules: Mutex<Vec<TradingRules>>,
    pub balances: Mutex<Vec<Balance>>,
    pub prices: Mutex<Vec<SymbolPrice>>,
    pub open_orders: Mutex<Vec<OpenOrder>>,
    pub candles: Mutex<HashMap<String, Vec<Candlestick>>>,

    pub placed: Mutex<Vec<OrderRequest>>,
    pub cancelled: Mutex<Vec<(String, u64)>>,
    pub keepalives: Mutex<Vec<String>>,
    pub closed_keys: Mutex<Vec<String>>,

    pub rules_fetches: AtomicUsize,
    pub streams_started: AtomicUsize,
    next_order_id: AtomicU64,

    pub fail_rules: AtomicBool,
    pub fail_keepalive: AtomicBool,
    pub fail_start_stream: AtomicBool,
}

impl MockExchange {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rules: Mutex::new(Vec::new()),
            balances: Mutex::new(Vec::new()),
            prices: Mutex::new(Vec::new()),
            open_orders: Mutex::new(Vec::new()),
            candles: Mutex::new(HashMap::new()),
            placed: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            keepalives: Mutex::new(Vec::new()),
            closed_keys: Mutex::new(Vec::new()),
            rules_fetches: AtomicUsize::new(0),
            streams_started: AtomicUsize::new(0),
            next_order_id: AtomicU64::new(1),
            fail_rules: AtomicBool::new(false),
            fail_keepalive: AtomicBool::new(false),
            fail_start_stream: AtomicBool::new(false),
        })
    }

    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.placed.lock().unwrap().clone()
    }

    pub fn cancelled_orders(&self) -> Vec<(String, u64)> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    async fn account_info(&self) -> ExchangeResult<AccountSnapshot> {
        Ok(AccountSnapshot::new(
            self.balances.lock().unwrap().clone(),
            Utc::now(),
        ))
    }

    async fn trading_rules(&self) -> ExchangeResult<RulesSnapshot> {
        self.rules_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_rules.load(Ordering::SeqCst) {
            return Err(ExchangeError::Transport("scripted failure".to_string()));
        }
        Ok(RulesSnapshot::new(
            self.rules.lock().unwrap().clone(),
            Utc::now(),
        ))
    }

    async fn all_prices(&self) -> ExchangeResult<Vec<SymbolPrice>> {
        Ok(self.prices.lock().unwrap().clone())
    }

    async fn ticker_24h(&self, symbol: &str) -> ExchangeResult<Ticker24h> {
        let price = self
            .prices
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.symbol == symbol)
            .map(|p| p.price)
            .unwrap_or(Decimal::ZERO);
        Ok(Ticker24h {
            symbol: symbol.to_string(),
            bid_price: price,
            ask_price: price,
            last_price: price,
            price_change_pct: Decimal::ZERO,
        })
    }

    async fn open_orders(&self) -> ExchangeResult<Vec<OpenOrder>> {
        Ok(self.open_orders.lock().unwrap().clone())
    }

    async fn place_order(&self, request: &OrderRequest) -> ExchangeResult<OrderAck> {
        self.placed.lock().unwrap().push(request.clone());
        Ok(OrderAck {
            order_id: self.next_order_id.fetch_add(1, Ordering::SeqCst),
            symbol: request.symbol.clone(),
            status: OrderStatus::New,
        })
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> ExchangeResult<CancelAck> {
        self.cancelled
            .lock()
            .unwrap()
            .push((symbol.to_string(), order_id));
        Ok(CancelAck {
            order_id,
            symbol: symbol.to_string(),
        })
    }

    async fn candles(
        &self,
        symbol: &str,
        _interval: CandleInterval,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> ExchangeResult<Vec<Candlestick>> {
        Ok(self
            .candles
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn start_user_stream(&self) -> ExchangeResult<String> {
        if self.fail_start_stream.load(Ordering::SeqCst) {
            return Err(ExchangeError::Transport("scripted failure".to_string()));
        }
        let n = self.streams_started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("listen-key-{}", n))
    }

    async fn keepalive_user_stream(&self, listen_key: &str) -> ExchangeResult<()> {
        if self.fail_keepalive.load(Ordering::SeqCst) {
            return Err(ExchangeError::Transport("scripted failure".to_string()));
        }
        self.keepalives
            .lock()
            .unwrap()
            .push(listen_key.to_string());
        Ok(())
    }

    async fn close_user_stream(&self, listen_key: &str) -> ExchangeResult<()> {
        self.closed_keys
            .lock()
            .unwrap()
            .push(listen_key.to_string());
        Ok(())
    }

    async fn listen_user_stream(
        &self,
        _listen_key: &str,
        _events: UnboundedSender<UserStreamEvent>,
    ) -> ExchangeResult<JoinHandle<()>> {
        // The tests inject events directly; the listener just parks.
        Ok(tokio::spawn(std::future::pending()))
    }
}

/// Trading rules for tests: tick/step/min-notional with open bounds.
pub fn test_rules(
    symbol: &str,
    base: &str,
    quote: &str,
    tick_size: Decimal,
    step_size: Decimal,
    min_notional: Decimal,
) -> TradingRules {
    TradingRules {
        symbol: symbol.to_string(),
        base_asset: base.to_string(),
        quote_asset: quote.to_string(),
        tradable: true,
        tick_size,
        step_size,
        min_notional,
        min_price: Decimal::ZERO,
        max_price: Decimal::ZERO,
        min_qty: Decimal::ZERO,
        max_qty: Decimal::ZERO,
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig::from_yaml(
        r#"
exchange:
  rest_url: https://api.example.com
  ws_url: wss://stream.example.com
trading:
  quote_asset: USDT
  fee_asset: BNB
  profit_ratio_pct: "1.0"
  min_order_size: "10"
  order_expiration_mins: 60
  fee_top_up_threshold: "0"
jobs:
  maintenance_secs: 60
  refresh_secs: 300
  volatility_secs: 600
  stream_health_secs: 60
volatility:
  candle_interval: "15m"
  window: 16
log_level: info
"#,
    )
    .expect("test config is valid")
}

/// Engine wired to the mock, with the rules cache pre-populated.
pub async fn engine_with(
    client: Arc<MockExchange>,
) -> (
    Arc<Engine>,
    tokio::sync::mpsc::UnboundedReceiver<UserStreamEvent>,
) {
    let shutdown = Arc::new(ShutdownManager::new());
    let (engine, events_rx) = Engine::new(test_config(), client, shutdown);
    engine
        .rules
        .ensure_fresh()
        .await
        .expect("mock rules load");
    (engine, events_rx)
}

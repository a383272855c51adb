//! The orchestration engine.
//!
//! Owns the shared state (rules cache, account state, stream session,
//! volatility table) and drives four independently-scheduled recurring
//! jobs plus the push-event dispatch loop. One job's failure never
//! blocks another; the engine runs until the operator requests
//! shutdown.

use crate::application::job::{run_recurring, JobSpec};
use crate::domain::{TradingRules, OrderAck, OrderRequest, UserStreamEvent, VolatilityTable};
use crate::domain::quantize::validate;
use crate::infrastructure::client::ExchangeClient;
use crate::infrastructure::{AccountState, EngineConfig, RulesCache, StreamSession};
use crate::utils::{with_startup_retry, ShutdownManager, StartupError};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, info, warn};

/// Long-running trading engine; see [`Engine::start`].
pub struct Engine {
    pub config: EngineConfig,
    pub client: Arc<dyn ExchangeClient>,
    pub rules: Arc<RulesCache>,
    pub account: Arc<AccountState>,
    pub stream: Arc<StreamSession>,
    volatility: RwLock<Arc<VolatilityTable>>,
    pub shutdown: Arc<ShutdownManager>,
}

impl Engine {
    /// Build the engine and the receiving end of the push-event channel.
    pub fn new(
        config: EngineConfig,
        client: Arc<dyn ExchangeClient>,
        shutdown: Arc<ShutdownManager>,
    ) -> (Arc<Self>, UnboundedReceiver<UserStreamEvent>) {
        let (events_tx, events_rx) = unbounded_channel();

        let rules_ttl = chrono::Duration::seconds(config.jobs.rules_ttl_secs as i64);
        let rules = Arc::new(RulesCache::new(Arc::clone(&client), rules_ttl));
        let account = Arc::new(AccountState::new());
        let stream = Arc::new(StreamSession::new(Arc::clone(&client), events_tx));

        let engine = Arc::new(Self {
            config,
            client,
            rules,
            account,
            stream,
            volatility: RwLock::new(Arc::new(VolatilityTable::empty())),
            shutdown,
        });
        (engine, events_rx)
    }

    /// Run the engine until cancelled. Convenience over
    /// [`new`](Self::new) + [`run`](Self::run).
    pub async fn start(
        config: EngineConfig,
        client: Arc<dyn ExchangeClient>,
        shutdown: Arc<ShutdownManager>,
    ) -> anyhow::Result<()> {
        let (engine, events_rx) = Self::new(config, client, shutdown);
        engine.run(events_rx).await
    }

    /// Startup (bounded retry), job spawn, dispatch, teardown.
    pub async fn run(
        self: Arc<Self>,
        events_rx: UnboundedReceiver<UserStreamEvent>,
    ) -> anyhow::Result<()> {
        info!(
            "Engine starting (quote asset {}, fee asset {})",
            self.config.trading.quote_asset, self.config.trading.fee_asset
        );

        // Initial rules + funds load and first listen, retried on the
        // fixed ladder before giving up.
        let startup = {
            let engine = Arc::clone(&self);
            with_startup_retry("initial load", &self.shutdown, move || {
                let engine = Arc::clone(&engine);
                async move { engine.initial_load().await }
            })
            .await
        };
        match startup {
            Ok(()) => {}
            Err(StartupError::Cancelled) => {
                info!("Engine cancelled during startup");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let jobs = &self.config.jobs;
        let run_budget = Duration::from_secs(jobs.run_budget_secs);
        let specs = [
            (
                JobSpec::new(
                    "maintenance",
                    Duration::from_secs(jobs.maintenance_secs),
                    run_budget,
                ),
                JobKind::Maintenance,
            ),
            (
                JobSpec::new(
                    "refresh",
                    Duration::from_secs(jobs.refresh_secs),
                    run_budget,
                ),
                JobKind::Refresh,
            ),
            (
                JobSpec::new(
                    "ranking",
                    Duration::from_secs(jobs.volatility_secs),
                    run_budget,
                ),
                JobKind::Ranking,
            ),
            (
                JobSpec::new(
                    "stream-health",
                    Duration::from_secs(jobs.stream_health_secs),
                    run_budget,
                ),
                JobKind::StreamHealth,
            ),
        ];

        let mut handles = Vec::new();
        for (spec, kind) in specs {
            let engine = Arc::clone(&self);
            let shutdown = Arc::clone(&self.shutdown);
            handles.push(tokio::spawn(async move {
                run_recurring(spec, shutdown, move || {
                    let engine = Arc::clone(&engine);
                    async move { engine.run_job(kind).await }
                })
                .await;
            }));
        }

        let dispatch = {
            let engine = Arc::clone(&self);
            tokio::spawn(async move { engine.run_dispatch(events_rx).await })
        };

        // Park until the operator asks us to stop.
        while self.shutdown.is_running() {
            self.shutdown
                .interruptible_sleep(Duration::from_secs(1))
                .await;
        }

        info!("Engine shutting down");
        self.stream.stop().await;
        dispatch.abort();
        for handle in handles {
            let _ = handle.await;
        }
        info!("Engine stopped");
        Ok(())
    }

    async fn initial_load(&self) -> anyhow::Result<()> {
        self.rules.ensure_fresh().await?;
        let snapshot = self.client.account_info().await?;
        info!("[startup] loaded {} asset balances", snapshot.len());
        self.account.replace(snapshot);
        self.stream.start().await?;
        Ok(())
    }

    async fn run_job(&self, kind: JobKind) -> anyhow::Result<()> {
        match kind {
            JobKind::Maintenance => self.run_order_maintenance().await,
            JobKind::Refresh => self.run_rules_and_funds().await,
            JobKind::Ranking => self.run_volatility_ranking().await,
            JobKind::StreamHealth => self.run_stream_health().await,
        }
    }

    /// Push-event dispatch loop. Events are handled in arrival order;
    /// each event also feeds the stream watchdog clock.
    pub async fn run_dispatch(&self, mut events_rx: UnboundedReceiver<UserStreamEvent>) {
        info!("[dispatch] push-event loop started");
        while let Some(event) = events_rx.recv().await {
            if !self.shutdown.is_running() {
                break;
            }
            self.stream.touch();
            match event {
                UserStreamEvent::AccountUpdate { balances } => {
                    self.account.apply_delta(&balances);
                }
                UserStreamEvent::OrderUpdate(update) => {
                    self.react_to_order_update(&update).await;
                }
            }
        }
        info!("[dispatch] push-event loop stopped");
    }

    /// Keep the push connection alive; force a reset when it has been
    /// silent for too long, because a dead connection and a quiet
    /// market look identical from here.
    pub async fn run_stream_health(&self) -> anyhow::Result<()> {
        let max_idle = chrono::Duration::seconds(self.config.jobs.stream_max_idle_secs as i64);
        let idle = self.stream.idle_for();
        if idle > max_idle {
            warn!(
                "[stream-health] no events for {}s, forcing session reset",
                idle.num_seconds()
            );
            self.stream.force_reset().await?;
        } else {
            self.stream.keep_alive().await?;
        }
        Ok(())
    }

    /// Validate and submit one order. A validation failure is normal
    /// control flow: log and drop. An exchange rejection is logged
    /// with full request context and never blindly retried.
    pub(crate) async fn submit_validated(
        &self,
        request: OrderRequest,
        rules: &TradingRules,
    ) -> Option<OrderAck> {
        if let Err(reason) = validate(&request, rules) {
            info!(
                "[orders] dropping {} {} {} @ {}: {}",
                request.side, request.quantity, request.symbol, request.price, reason
            );
            return None;
        }

        match self.client.place_order(&request).await {
            Ok(ack) => {
                info!(
                    "[orders] placed {} {} {} @ {} (order {})",
                    request.side, request.quantity, request.symbol, request.price, ack.order_id
                );
                Some(ack)
            }
            Err(e) => {
                warn!(
                    "[orders] failed to place {} {} {} @ {}: {}",
                    request.side, request.quantity, request.symbol, request.price, e
                );
                None
            }
        }
    }

    /// Latest price per symbol, as a lookup map.
    pub(crate) async fn price_map(&self) -> anyhow::Result<HashMap<String, Decimal>> {
        let prices = self.client.all_prices().await?;
        Ok(prices.into_iter().map(|p| (p.symbol, p.price)).collect())
    }

    pub fn volatility_table(&self) -> Arc<VolatilityTable> {
        Arc::clone(&self.volatility.read())
    }

    pub fn replace_volatility(&self, table: VolatilityTable) {
        *self.volatility.write() = Arc::new(table);
    }

    pub(crate) fn profit_markup(&self) -> Decimal {
        Decimal::ONE + self.config.trading.profit_ratio_pct / Decimal::ONE_HUNDRED
    }

    pub(crate) fn profit_discount(&self) -> Decimal {
        Decimal::ONE - self.config.trading.profit_ratio_pct / Decimal::ONE_HUNDRED
    }

    /// Symbol under which `base_asset` trades against the configured
    /// quote asset.
    pub(crate) fn symbol_for(&self, base_asset: &str) -> String {
        format!("{}{}", base_asset, self.config.trading.quote_asset)
    }
}

#[derive(Debug, Clone, Copy)]
enum JobKind {
    Maintenance,
    Refresh,
    Ranking,
    StreamHealth,
}

impl Engine {
    /// Dispatch-loop entry for order lifecycle events; failures are
    /// logged here so one bad event never stalls the loop.
    async fn react_to_order_update(&self, update: &crate::domain::OrderUpdate) {
        if let Err(e) = self.handle_order_update(update).await {
            warn!(
                "[dispatch] failed to handle update for {} (order {}): {:#}",
                update.symbol, update.order_id, e
            );
        }
        debug!(
            "[dispatch] processed {} update for {}",
            update.status, update.symbol
        );
    }
}

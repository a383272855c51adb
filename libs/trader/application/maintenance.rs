//! Order maintenance job.
//!
//! The short-interval sweep: cancel aged-out orders, keep the fee
//! balance topped up, turn free base balances into sell orders and the
//! free quote balance into fairly-distributed buy orders. Per-symbol
//! work runs concurrently; each symbol's failure is logged on its own
//! and never aborts the rest of the sweep.

use crate::application::engine::Engine;
use crate::domain::quantize::{min_qty_for_notional, snap_price_down, snap_qty_down};
use crate::domain::{
    split_buy_budget, split_sell_budget, BuyCandidate, OpenOrder, OrderRequest, RulesSnapshot,
    Side, TradingRules,
};
use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info, warn};

impl Engine {
    /// One maintenance sweep.
    pub async fn run_order_maintenance(&self) -> anyhow::Result<()> {
        let Some(rules) = self.rules.current() else {
            warn!("[maintenance] no rules snapshot yet, skipping sweep");
            return Ok(());
        };

        let open_orders = self.client.open_orders().await?;
        self.cancel_expired_orders(&open_orders, &rules).await;

        let prices = self.price_map().await?;
        self.top_up_fee_asset(&rules, &prices).await;
        self.place_sell_orders(&rules, &prices).await;
        self.place_buy_orders(&rules, &prices, &open_orders).await;
        Ok(())
    }

    /// Cancel open orders older than the configured expiration,
    /// skipping symbols the exchange currently marks non-tradable.
    async fn cancel_expired_orders(&self, open_orders: &[OpenOrder], rules: &RulesSnapshot) {
        let expiration =
            chrono::Duration::minutes(self.config.trading.order_expiration_mins as i64);
        let now = Utc::now();

        let expired: Vec<&OpenOrder> = open_orders
            .iter()
            .filter(|o| o.status.is_open() && o.age(now) > expiration)
            .filter(|o| rules.get(&o.symbol).map(|r| r.tradable).unwrap_or(false))
            .collect();
        if expired.is_empty() {
            return;
        }

        info!("[maintenance] cancelling {} expired orders", expired.len());
        let results = join_all(expired.iter().map(|order| async move {
            self.client
                .cancel_order(&order.symbol, order.order_id)
                .await
                .map_err(|e| (*order, e))
        }))
        .await;

        for result in results {
            match result {
                Ok(ack) => debug!(
                    "[maintenance] cancelled {} order {}",
                    ack.symbol, ack.order_id
                ),
                Err((order, e)) => warn!(
                    "[maintenance] failed to cancel {} order {} ({} {} @ {}): {}",
                    order.symbol, order.order_id, order.side, order.original_qty, order.price, e
                ),
            }
        }
    }

    /// Buy a minimal amount of the fee asset when its quote value drops
    /// below the configured threshold, so fills never fail on fees.
    async fn top_up_fee_asset(&self, rules: &RulesSnapshot, prices: &HashMap<String, Decimal>) {
        let trading = &self.config.trading;
        if trading.fee_top_up_threshold <= Decimal::ZERO {
            return;
        }

        let fee_symbol = self.symbol_for(&trading.fee_asset);
        let Some(fee_rules) = rules.get(&fee_symbol) else {
            return;
        };
        if !fee_rules.tradable {
            return;
        }
        let Some(&price) = prices.get(&fee_symbol) else {
            return;
        };
        if price <= Decimal::ZERO {
            return;
        }

        let held_value = self.account.free(&trading.fee_asset) * price;
        if held_value >= trading.fee_top_up_threshold {
            return;
        }

        let quantity = min_qty_for_notional(fee_rules, price);
        if quantity <= Decimal::ZERO {
            return;
        }
        info!(
            "[maintenance] fee balance low ({} {} worth), buying {} {}",
            held_value.round_dp(4),
            trading.quote_asset,
            quantity,
            trading.fee_asset
        );
        let request = OrderRequest::market(fee_symbol, Side::Buy, quantity);
        self.submit_validated(request, fee_rules).await;
    }

    /// Sell every free base balance worth at least one minimum order,
    /// at the current price marked up by the profit ratio.
    async fn place_sell_orders(&self, rules: &RulesSnapshot, prices: &HashMap<String, Decimal>) {
        let trading = &self.config.trading;
        let account = self.account.snapshot();
        let markup = self.profit_markup();

        let mut batches: Vec<(TradingRules, Vec<OrderRequest>)> = Vec::new();
        for balance in account.balances() {
            if balance.asset == trading.quote_asset || balance.asset == trading.fee_asset {
                continue;
            }
            let symbol = self.symbol_for(&balance.asset);
            let Some(symbol_rules) = rules.get(&symbol) else {
                continue;
            };
            if !symbol_rules.tradable {
                continue;
            }
            let Some(&price) = prices.get(&symbol) else {
                continue;
            };
            if price <= Decimal::ZERO || balance.free * price < trading.min_order_size {
                continue;
            }

            let sell_price = snap_price_down(price * markup, symbol_rules.tick_size);
            if sell_price <= Decimal::ZERO {
                continue;
            }
            let quantities = split_sell_budget(
                balance.free,
                trading.min_order_size,
                price,
                symbol_rules.step_size,
            );
            if quantities.is_empty() {
                continue;
            }

            let requests = quantities
                .into_iter()
                .map(|qty| OrderRequest::limit(symbol.clone(), Side::Sell, qty, sell_price))
                .collect();
            batches.push((symbol_rules.clone(), requests));
        }
        if batches.is_empty() {
            return;
        }

        info!(
            "[maintenance] placing sell orders for {} symbols",
            batches.len()
        );
        // Symbols in parallel; one symbol's orders stay ordered so the
        // remainder order lands last.
        join_all(batches.iter().map(|(symbol_rules, requests)| async move {
            for request in requests {
                self.submit_validated(request.clone(), symbol_rules).await;
            }
        }))
        .await;
    }

    /// Distribute the free quote balance into buy orders across the
    /// tradable universe, weighted by volatility and balanced against
    /// existing open-order pressure.
    async fn place_buy_orders(
        &self,
        rules: &RulesSnapshot,
        prices: &HashMap<String, Decimal>,
        open_orders: &[OpenOrder],
    ) {
        let trading = &self.config.trading;
        let free_quote = self.account.free(&trading.quote_asset);
        if free_quote < trading.min_order_size {
            return;
        }

        let mut pressure: HashMap<&str, usize> = HashMap::new();
        for order in open_orders.iter().filter(|o| o.status.is_open()) {
            *pressure.entry(order.symbol.as_str()).or_default() += 1;
        }

        let volatility = self.volatility_table();
        let candidates: Vec<BuyCandidate> = rules
            .base_assets_for(&trading.quote_asset, &trading.fee_asset)
            .into_iter()
            .filter_map(|base| {
                let symbol = self.symbol_for(&base);
                let price = prices.get(&symbol).copied()?;
                if price <= Decimal::ZERO {
                    return None;
                }
                let open = pressure.get(symbol.as_str()).copied().unwrap_or(0);
                Some(BuyCandidate::new(symbol, open, volatility.weight_for(&base)))
            })
            .collect();
        if candidates.is_empty() {
            return;
        }

        let allocations = split_buy_budget(free_quote, trading.min_order_size, &candidates);
        if allocations.is_empty() {
            return;
        }
        info!(
            "[maintenance] distributing {} {} across {} symbols",
            free_quote,
            trading.quote_asset,
            allocations.len()
        );

        join_all(allocations.iter().map(|(symbol, amounts)| async move {
            let Some(symbol_rules) = rules.get(symbol) else {
                return;
            };
            let Some(&price) = prices.get(symbol) else {
                return;
            };
            let buy_price = snap_price_down(price, symbol_rules.tick_size);
            if buy_price <= Decimal::ZERO {
                return;
            }
            for amount in amounts {
                let quantity = snap_qty_down(amount / buy_price, symbol_rules.step_size);
                if quantity <= Decimal::ZERO {
                    debug!("[maintenance] {} allocation {} too small, skipping", symbol, amount);
                    continue;
                }
                let request =
                    OrderRequest::limit(symbol.clone(), Side::Buy, quantity, buy_price);
                self.submit_validated(request, symbol_rules).await;
            }
        }))
        .await;
    }
}

//! Rules & funds refresh job.

use crate::application::engine::Engine;
use rust_decimal::Decimal;
use tracing::{info, warn};

impl Engine {
    /// Medium-interval refresh: freshen the trading rules, pull a full
    /// account snapshot, and report where the funds sit.
    pub async fn run_rules_and_funds(&self) -> anyhow::Result<()> {
        let trading = &self.config.trading;

        self.rules.ensure_fresh().await?;
        let universe = self
            .rules
            .base_assets_for(&trading.quote_asset, &trading.fee_asset)?;
        info!(
            "[refresh] {} assets tradable against {}",
            universe.len(),
            trading.quote_asset
        );

        let snapshot = self.client.account_info().await?;
        self.account.replace(snapshot);

        self.report_funds().await;
        Ok(())
    }

    /// Funds summary: total account value expressed in the quote asset.
    /// Best-effort: a missing price feed only skips the report.
    async fn report_funds(&self) {
        let prices = match self.price_map().await {
            Ok(prices) => prices,
            Err(e) => {
                warn!("[refresh] funds report skipped, no prices: {:#}", e);
                return;
            }
        };

        let trading = &self.config.trading;
        let account = self.account.snapshot();
        let mut total = Decimal::ZERO;
        let mut valued = 0usize;
        let mut unpriced = 0usize;

        for balance in account.balances() {
            let amount = balance.total();
            if amount <= Decimal::ZERO {
                continue;
            }
            if balance.asset == trading.quote_asset {
                total += amount;
                valued += 1;
            } else if let Some(price) = prices.get(&self.symbol_for(&balance.asset)) {
                total += amount * price;
                valued += 1;
            } else {
                unpriced += 1;
            }
        }

        info!(
            "[refresh] funds summary: ~{} {} across {} assets ({} unpriced)",
            total.round_dp(2),
            trading.quote_asset,
            valued,
            unpriced
        );
    }
}

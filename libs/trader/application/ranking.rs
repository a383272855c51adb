//! Volatility ranking job.
//!
//! Rebuilds the dispersion table from recent candles. The table only
//! weighs the buy allocator's tie-breaks and feeds reporting; it never
//! sizes an order.

use crate::application::engine::Engine;
use crate::domain::{dispersion, VolatilityTable};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, info, warn};

impl Engine {
    pub async fn run_volatility_ranking(&self) -> anyhow::Result<()> {
        let Some(rules) = self.rules.current() else {
            debug!("[ranking] no rules snapshot yet, skipping");
            return Ok(());
        };

        let trading = &self.config.trading;
        let cfg = &self.config.volatility;
        let end = Utc::now();
        let start = end - cfg.candle_interval.duration() * (cfg.window as i32);

        let bases = rules.base_assets_for(&trading.quote_asset, &trading.fee_asset);
        if bases.is_empty() {
            return Ok(());
        }

        let results = join_all(bases.iter().map(|base| {
            let symbol = self.symbol_for(base);
            async move {
                match self
                    .client
                    .candles(&symbol, cfg.candle_interval, start, end)
                    .await
                {
                    Ok(candles) => Some((base.clone(), dispersion(&candles))),
                    Err(e) => {
                        warn!("[ranking] candles unavailable for {}: {}", symbol, e);
                        None
                    }
                }
            }
        }))
        .await;

        let scores: HashMap<String, f64> = results.into_iter().flatten().collect();
        let table = VolatilityTable::new(scores, Utc::now());

        let top: Vec<String> = table
            .ranked()
            .into_iter()
            .take(5)
            .map(|(asset, score)| format!("{} {:.4}", asset, score))
            .collect();
        info!(
            "[ranking] scored {} assets; most volatile: {}",
            table.len(),
            top.join(", ")
        );

        self.replace_volatility(table);
        Ok(())
    }
}

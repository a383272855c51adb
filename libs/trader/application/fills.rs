//! Fill reaction.
//!
//! Every completed buy spawns the matching profit-marked sell; every
//! completed sell re-enters with a discounted buy. This is the cycle
//! that keeps the engine trading without human input.

use crate::application::engine::Engine;
use crate::domain::quantize::{snap_price_down, snap_qty_down};
use crate::domain::{OrderRequest, OrderStatus, OrderUpdate, Side, TradingRules};
use rust_decimal::Decimal;
use tracing::{debug, warn};

impl Engine {
    /// React to one order lifecycle event from the push connection.
    ///
    /// Only terminal `Filled` events trigger a follow-up; everything
    /// else is bookkeeping noise. Fee-asset fills come from top-up
    /// orders and never spawn a cycle.
    pub async fn handle_order_update(&self, update: &OrderUpdate) -> anyhow::Result<()> {
        if update.status != OrderStatus::Filled {
            return Ok(());
        }

        let rules = match self.rules.rules_for(&update.symbol) {
            Ok(rules) => rules,
            Err(e) => {
                // No usable rules this cycle; skip rather than guess.
                warn!(
                    "[fills] no rules for {}, skipping follow-up: {}",
                    update.symbol, e
                );
                return Ok(());
            }
        };

        if rules.base_asset == self.config.trading.fee_asset {
            debug!("[fills] ignoring fee-asset fill on {}", update.symbol);
            return Ok(());
        }

        let follow_up = match update.side {
            Side::Buy => self.sell_after_buy_fill(update, &rules),
            Side::Sell => self.buy_after_sell_fill(update, &rules),
        };

        if let Some(request) = follow_up {
            self.submit_validated(request, &rules).await;
        }
        Ok(())
    }

    /// A filled buy exits via a sell at `fill_price × (1 + profit%)`,
    /// snapped down to the tick, for the filled quantity snapped down
    /// to the step.
    fn sell_after_buy_fill(
        &self,
        update: &OrderUpdate,
        rules: &TradingRules,
    ) -> Option<OrderRequest> {
        let price = snap_price_down(update.price * self.profit_markup(), rules.tick_size);
        let quantity = snap_qty_down(update.quantity, rules.step_size);
        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            debug!(
                "[fills] buy fill on {} too small for a follow-up sell",
                update.symbol
            );
            return None;
        }
        Some(OrderRequest::limit(
            update.symbol.clone(),
            Side::Sell,
            quantity,
            price,
        ))
    }

    /// A filled sell re-enters via a buy at `fill_price × (1 − profit%)`
    /// snapped down, spending the sale's quote proceeds.
    fn buy_after_sell_fill(
        &self,
        update: &OrderUpdate,
        rules: &TradingRules,
    ) -> Option<OrderRequest> {
        let price = snap_price_down(update.price * self.profit_discount(), rules.tick_size);
        if price <= Decimal::ZERO {
            debug!(
                "[fills] sell fill on {} leaves no valid re-entry price",
                update.symbol
            );
            return None;
        }

        let proceeds = if update.cumulative_quote > Decimal::ZERO {
            update.cumulative_quote
        } else {
            update.price * update.quantity
        };
        let quantity = snap_qty_down(proceeds / price, rules.step_size);
        if quantity <= Decimal::ZERO {
            debug!(
                "[fills] sell fill on {} too small for a follow-up buy",
                update.symbol
            );
            return None;
        }
        Some(OrderRequest::limit(
            update.symbol.clone(),
            Side::Buy,
            quantity,
            price,
        ))
    }
}

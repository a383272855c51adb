//! Exchange-published trading constraints, per symbol.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Trading constraints for one symbol, as published by the exchange.
///
/// Immutable snapshot value; a refresh replaces the whole containing
/// [`RulesSnapshot`], entries are never mutated in place. A bound of
/// zero means the exchange does not enforce that bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingRules {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub tradable: bool,
    /// Minimum price increment.
    pub tick_size: Decimal,
    /// Minimum quantity increment.
    pub step_size: Decimal,
    /// Minimum order value (price × quantity).
    pub min_notional: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub min_qty: Decimal,
    pub max_qty: Decimal,
}

/// Immutable collection of all symbols' trading rules plus the capture
/// time. Superseded atomically by the next successful fetch.
#[derive(Debug, Clone)]
pub struct RulesSnapshot {
    rules: HashMap<String, TradingRules>,
    pub captured_at: DateTime<Utc>,
}

impl RulesSnapshot {
    pub fn new(rules: Vec<TradingRules>, captured_at: DateTime<Utc>) -> Self {
        let rules = rules.into_iter().map(|r| (r.symbol.clone(), r)).collect();
        Self { rules, captured_at }
    }

    pub fn get(&self, symbol: &str) -> Option<&TradingRules> {
        self.rules.get(symbol)
    }

    /// All base assets tradable against `quote_asset`, excluding
    /// `exclude` (typically the fee asset). Sorted for determinism.
    pub fn base_assets_for(&self, quote_asset: &str, exclude: &str) -> Vec<String> {
        let mut assets: Vec<String> = self
            .rules
            .values()
            .filter(|r| r.tradable && r.quote_asset == quote_asset && r.base_asset != exclude)
            .map(|r| r.base_asset.clone())
            .collect();
        assets.sort();
        assets.dedup();
        assets
    }

    pub fn symbols(&self) -> impl Iterator<Item = &TradingRules> {
        self.rules.values()
    }

    pub fn is_stale(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.captured_at) > ttl
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

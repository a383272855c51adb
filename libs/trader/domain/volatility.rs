//! Volatility scoring over recent candles.
//!
//! Produces a dispersion score per base asset, used only to rank and
//! weight trading assets. Scores never feed order sizing, so plain
//! floating point is fine here.

use crate::domain::models::Candlestick;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;

/// Relative standard deviation of candle closes over the window.
///
/// Returns 0.0 for windows with fewer than two candles or a zero mean.
pub fn dispersion(candles: &[Candlestick]) -> f64 {
    if candles.len() < 2 {
        return 0.0;
    }
    let closes: Vec<f64> = candles
        .iter()
        .filter_map(|c| c.close.to_f64())
        .collect();
    if closes.len() < 2 {
        return 0.0;
    }

    let mean = closes.iter().sum::<f64>() / closes.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = closes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / closes.len() as f64;
    variance.sqrt() / mean
}

/// Dispersion scores per base asset, recomputed periodically and
/// replaced wholesale.
#[derive(Debug, Clone)]
pub struct VolatilityTable {
    scores: HashMap<String, f64>,
    pub computed_at: DateTime<Utc>,
}

impl VolatilityTable {
    pub fn new(scores: HashMap<String, f64>, computed_at: DateTime<Utc>) -> Self {
        Self {
            scores,
            computed_at,
        }
    }

    pub fn empty() -> Self {
        Self {
            scores: HashMap::new(),
            computed_at: Utc::now(),
        }
    }

    pub fn score(&self, base_asset: &str) -> Option<f64> {
        self.scores.get(base_asset).copied()
    }

    /// Allocation tie-break weight; unknown assets weigh nothing.
    pub fn weight_for(&self, base_asset: &str) -> f64 {
        self.score(base_asset).unwrap_or(0.0)
    }

    /// Assets sorted by descending score, for reporting.
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> =
            self.scores.iter().map(|(a, s)| (a.clone(), *s)).collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn candle(close: Decimal) -> Candlestick {
        let now = Utc::now();
        Candlestick {
            open_time: now,
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1),
            close_time: now,
        }
    }

    #[test]
    fn flat_series_has_zero_dispersion() {
        let candles: Vec<Candlestick> = (0..10).map(|_| candle(dec!(100))).collect();
        assert_eq!(dispersion(&candles), 0.0);
    }

    #[test]
    fn wider_swings_score_higher() {
        let calm: Vec<Candlestick> = [100, 101, 99, 100, 101]
            .iter()
            .map(|c| candle(Decimal::from(*c)))
            .collect();
        let wild: Vec<Candlestick> = [100, 140, 60, 130, 80]
            .iter()
            .map(|c| candle(Decimal::from(*c)))
            .collect();
        assert!(dispersion(&wild) > dispersion(&calm));
    }

    #[test]
    fn short_windows_score_zero() {
        assert_eq!(dispersion(&[]), 0.0);
        assert_eq!(dispersion(&[candle(dec!(100))]), 0.0);
    }

    #[test]
    fn table_ranks_by_score() {
        let mut scores = HashMap::new();
        scores.insert("ETH".to_string(), 0.04);
        scores.insert("XRP".to_string(), 0.09);
        scores.insert("LTC".to_string(), 0.01);
        let table = VolatilityTable::new(scores, Utc::now());

        let ranked = table.ranked();
        assert_eq!(ranked[0].0, "XRP");
        assert_eq!(ranked[2].0, "LTC");
        assert_eq!(table.weight_for("ETH"), 0.04);
        assert_eq!(table.weight_for("UNKNOWN"), 0.0);
    }
}

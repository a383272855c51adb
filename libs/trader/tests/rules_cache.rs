//! Rules cache freshness and failure behavior.

mod common;

use common::{test_rules, MockExchange};
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use trader::infrastructure::{RulesCache, RulesError};

fn cache_with(mock: &Arc<MockExchange>, ttl_secs: i64) -> RulesCache {
    RulesCache::new(mock.clone(), chrono::Duration::seconds(ttl_secs))
}

#[tokio::test]
async fn fresh_snapshot_is_not_refetched() {
    let mock = MockExchange::new();
    mock.rules.lock().unwrap().push(test_rules(
        "ETHUSDT",
        "ETH",
        "USDT",
        dec!(0.01),
        dec!(0.001),
        dec!(5),
    ));
    let cache = cache_with(&mock, 300);

    cache.ensure_fresh().await.unwrap();
    cache.ensure_fresh().await.unwrap();

    assert_eq!(mock.rules_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let mock = MockExchange::new();
    mock.rules.lock().unwrap().push(test_rules(
        "ETHUSDT",
        "ETH",
        "USDT",
        dec!(0.01),
        dec!(0.001),
        dec!(5),
    ));
    // TTL of zero: every call refetches.
    let cache = cache_with(&mock, 0);

    cache.ensure_fresh().await.unwrap();
    mock.fail_rules.store(true, Ordering::SeqCst);

    let result = cache.ensure_fresh().await;
    assert!(matches!(result, Err(RulesError::Unavailable(_))));

    // The stale snapshot is still readable for lookups.
    let rules = cache.rules_for("ETHUSDT").unwrap();
    assert_eq!(rules.base_asset, "ETH");
}

#[tokio::test]
async fn unknown_symbol_is_a_typed_error() {
    let mock = MockExchange::new();
    mock.rules.lock().unwrap().push(test_rules(
        "ETHUSDT",
        "ETH",
        "USDT",
        dec!(0.01),
        dec!(0.001),
        dec!(5),
    ));
    let cache = cache_with(&mock, 300);
    cache.ensure_fresh().await.unwrap();

    assert!(matches!(
        cache.rules_for("GHOSTUSDT"),
        Err(RulesError::UnknownSymbol(_))
    ));
}

#[tokio::test]
async fn empty_cache_reports_empty() {
    let mock = MockExchange::new();
    let cache = cache_with(&mock, 300);

    assert!(matches!(cache.rules_for("ETHUSDT"), Err(RulesError::Empty)));
    assert!(matches!(
        cache.base_assets_for("USDT", "BNB"),
        Err(RulesError::Empty)
    ));
}

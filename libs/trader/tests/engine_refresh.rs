//! Rules & funds refresh and volatility ranking against the scripted
//! exchange.

mod common;

use common::{engine_with, test_rules, MockExchange};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use trader::domain::{Balance, Candlestick, SymbolPrice};

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

#[tokio::test]
async fn refresh_replaces_account_snapshot() {
    let mock = MockExchange::new();
    mock.rules.lock().unwrap().push(test_rules(
        "ETHUSDT",
        "ETH",
        "USDT",
        dec!(0.01),
        dec!(0.001),
        dec!(5),
    ));
    mock.prices.lock().unwrap().push(SymbolPrice {
        symbol: "ETHUSDT".to_string(),
        price: dec!(200),
    });
    let (engine, _rx) = engine_with(mock.clone()).await;

    assert_eq!(engine.account.free("USDT"), Decimal::ZERO);
    mock.balances
        .lock()
        .unwrap()
        .push(Balance::new("USDT", dec!(123.45), Decimal::ZERO));

    engine.run_rules_and_funds().await.unwrap();

    assert_eq!(engine.account.free("USDT"), dec!(123.45));
    // The snapshot from engine_with was still fresh: one fetch total.
    assert_eq!(mock.rules_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ranking_orders_assets_by_dispersion() {
    let mock = MockExchange::new();
    {
        let mut rules = mock.rules.lock().unwrap();
        rules.push(test_rules("ETHUSDT", "ETH", "USDT", dec!(0.01), dec!(0.001), dec!(5)));
        rules.push(test_rules("XRPUSDT", "XRP", "USDT", dec!(0.0001), dec!(1), dec!(5)));
    }
    {
        let mut candles = mock.candles.lock().unwrap();
        // ETH flat, XRP swinging.
        candles.insert(
            "ETHUSDT".to_string(),
            (0..16).map(|_| candle(dec!(200))).collect(),
        );
        candles.insert(
            "XRPUSDT".to_string(),
            (0..16)
                .map(|i| candle(if i % 2 == 0 { dec!(0.02) } else { dec!(0.03) }))
                .collect(),
        );
    }
    let (engine, _rx) = engine_with(mock.clone()).await;

    engine.run_volatility_ranking().await.unwrap();

    let table = engine.volatility_table();
    assert_eq!(table.weight_for("ETH"), 0.0);
    assert!(table.weight_for("XRP") > 0.0);
    assert_eq!(table.ranked()[0].0, "XRP");
}

//! Fill-reaction scenarios against the scripted exchange.

mod common;

use common::{engine_with, test_rules, MockExchange};
use chrono::Utc;
use rust_decimal_macros::dec;
use trader::domain::{OrderStatus, OrderType, OrderUpdate, Side};

fn filled(symbol: &str, side: Side, price: rust_decimal::Decimal, qty: rust_decimal::Decimal) -> OrderUpdate {
    OrderUpdate {
        order_id: 7,
        symbol: symbol.to_string(),
        side,
        status: OrderStatus::Filled,
        price,
        quantity: qty,
        cumulative_quote: price * qty,
        event_time: Utc::now(),
    }
}

#[tokio::test]
async fn filled_buy_spawns_profit_marked_sell() {
    let mock = MockExchange::new();
    mock.rules.lock().unwrap().push(test_rules(
        "XRPUSDT",
        "XRP",
        "USDT",
        dec!(0.0001),
        dec!(1),
        dec!(1),
    ));
    let (engine, _rx) = engine_with(mock.clone()).await;

    // Buy of 750 XRP filled at 0.02 with a 1% target profit.
    engine
        .handle_order_update(&filled("XRPUSDT", Side::Buy, dec!(0.02), dec!(750)))
        .await
        .unwrap();

    let placed = mock.placed_orders();
    assert_eq!(placed.len(), 1);
    let sell = &placed[0];
    assert_eq!(sell.side, Side::Sell);
    assert_eq!(sell.price, dec!(0.0202));
    assert_eq!(sell.quantity, dec!(750));
    assert_eq!(sell.order_type, OrderType::Limit);
}

#[tokio::test]
async fn filled_sell_spawns_discounted_buy() {
    let mock = MockExchange::new();
    mock.rules.lock().unwrap().push(test_rules(
        "ETHUSDT",
        "ETH",
        "USDT",
        dec!(0.01),
        dec!(0.001),
        dec!(1),
    ));
    let (engine, _rx) = engine_with(mock.clone()).await;

    // Sell of 0.5 ETH filled at 200: proceeds 100 USDT re-enter at 198.
    engine
        .handle_order_update(&filled("ETHUSDT", Side::Sell, dec!(200), dec!(0.5)))
        .await
        .unwrap();

    let placed = mock.placed_orders();
    assert_eq!(placed.len(), 1);
    let buy = &placed[0];
    assert_eq!(buy.side, Side::Buy);
    assert_eq!(buy.price, dec!(198.00));
    // 100 / 198 = 0.50505..., snapped down to the 0.001 step.
    assert_eq!(buy.quantity, dec!(0.505));
}

#[tokio::test]
async fn fee_asset_fill_is_ignored() {
    let mock = MockExchange::new();
    mock.rules.lock().unwrap().push(test_rules(
        "BNBUSDT",
        "BNB",
        "USDT",
        dec!(0.01),
        dec!(0.001),
        dec!(1),
    ));
    let (engine, _rx) = engine_with(mock.clone()).await;

    engine
        .handle_order_update(&filled("BNBUSDT", Side::Buy, dec!(300), dec!(0.1)))
        .await
        .unwrap();

    assert!(mock.placed_orders().is_empty());
}

#[tokio::test]
async fn non_terminal_updates_spawn_nothing() {
    let mock = MockExchange::new();
    mock.rules.lock().unwrap().push(test_rules(
        "ETHUSDT",
        "ETH",
        "USDT",
        dec!(0.01),
        dec!(0.001),
        dec!(1),
    ));
    let (engine, _rx) = engine_with(mock.clone()).await;

    let mut update = filled("ETHUSDT", Side::Buy, dec!(200), dec!(0.5));
    update.status = OrderStatus::PartiallyFilled;
    engine.handle_order_update(&update).await.unwrap();

    let mut update = filled("ETHUSDT", Side::Buy, dec!(200), dec!(0.5));
    update.status = OrderStatus::Canceled;
    engine.handle_order_update(&update).await.unwrap();

    assert!(mock.placed_orders().is_empty());
}

#[tokio::test]
async fn invalid_follow_up_is_dropped_not_submitted() {
    let mock = MockExchange::new();
    // Follow-up sell notional (750 × 0.0202 = 15.15) sits below the
    // symbol's 20-quote minimum, so validation must reject it.
    mock.rules.lock().unwrap().push(test_rules(
        "XRPUSDT",
        "XRP",
        "USDT",
        dec!(0.0001),
        dec!(1),
        dec!(20),
    ));
    let (engine, _rx) = engine_with(mock.clone()).await;

    engine
        .handle_order_update(&filled("XRPUSDT", Side::Buy, dec!(0.02), dec!(750)))
        .await
        .unwrap();

    assert!(mock.placed_orders().is_empty());
}

#[tokio::test]
async fn unknown_symbol_skips_quietly() {
    let mock = MockExchange::new();
    let (engine, _rx) = engine_with(mock.clone()).await;

    engine
        .handle_order_update(&filled("GHOSTUSDT", Side::Buy, dec!(1), dec!(100)))
        .await
        .unwrap();

    assert!(mock.placed_orders().is_empty());
}

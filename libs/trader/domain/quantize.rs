//! Order quantization and validation.
//!
//! Pure functions that snap prices/quantities to the exchange-mandated
//! increments and check an [`OrderRequest`] against a symbol's
//! [`TradingRules`]. A failed check is a normal outcome, not a fault:
//! callers log the [`RejectReason`] and drop the order.

use crate::domain::models::{OrderRequest, OrderType};
use crate::domain::rules::TradingRules;
use rust_decimal::Decimal;
use thiserror::Error;

/// Snap a price down to the nearest tick-size multiple.
///
/// A non-positive tick size leaves the price untouched.
pub fn snap_price_down(price: Decimal, tick_size: Decimal) -> Decimal {
    if tick_size <= Decimal::ZERO {
        return price;
    }
    (price / tick_size).floor() * tick_size
}

/// Snap a quantity down to the nearest step-size multiple.
pub fn snap_qty_down(qty: Decimal, step_size: Decimal) -> Decimal {
    if step_size <= Decimal::ZERO {
        return qty;
    }
    (qty / step_size).floor() * step_size
}

/// Smallest step-aligned quantity whose notional at `price` reaches the
/// symbol's minimum notional.
///
/// The raw ratio is rounded UP to the next step multiple: rounding down
/// would silently produce an order below the exchange minimum.
pub fn min_qty_for_notional(rules: &TradingRules, price: Decimal) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = rules.min_notional / price;
    if rules.step_size <= Decimal::ZERO {
        return raw;
    }
    (raw / rules.step_size).ceil() * rules.step_size
}

/// Why an order request was rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("price {price} below minimum {min}")]
    PriceBelowMin { price: Decimal, min: Decimal },

    #[error("price {price} above maximum {max}")]
    PriceAboveMax { price: Decimal, max: Decimal },

    #[error("price {price} not a multiple of tick size {tick}")]
    PriceOffTick { price: Decimal, tick: Decimal },

    #[error("quantity {qty} below minimum {min}")]
    QtyBelowMin { qty: Decimal, min: Decimal },

    #[error("quantity {qty} above maximum {max}")]
    QtyAboveMax { qty: Decimal, max: Decimal },

    #[error("quantity {qty} not step-aligned (step {step}, base {base})")]
    QtyOffStep {
        qty: Decimal,
        step: Decimal,
        base: Decimal,
    },

    #[error("notional {notional} below minimum {min}")]
    BelowMinNotional { notional: Decimal, min: Decimal },
}

/// Check an order request against the symbol's trading rules.
///
/// A bound equal to zero disables that particular check (the exchange
/// publishes zero for bounds it does not enforce). Market orders carry
/// no price, so only the quantity checks apply to them.
pub fn validate(order: &OrderRequest, rules: &TradingRules) -> Result<(), RejectReason> {
    let check_price = order.order_type != OrderType::Market;

    if check_price {
        if (rules.min_price > Decimal::ZERO) && (order.price < rules.min_price) {
            return Err(RejectReason::PriceBelowMin {
                price: order.price,
                min: rules.min_price,
            });
        }
        if (rules.max_price > Decimal::ZERO) && (order.price > rules.max_price) {
            return Err(RejectReason::PriceAboveMax {
                price: order.price,
                max: rules.max_price,
            });
        }
        if (rules.tick_size > Decimal::ZERO) && !(order.price % rules.tick_size).is_zero() {
            return Err(RejectReason::PriceOffTick {
                price: order.price,
                tick: rules.tick_size,
            });
        }
    }

    if (rules.min_qty > Decimal::ZERO) && (order.quantity < rules.min_qty) {
        return Err(RejectReason::QtyBelowMin {
            qty: order.quantity,
            min: rules.min_qty,
        });
    }
    if (rules.max_qty > Decimal::ZERO) && (order.quantity > rules.max_qty) {
        return Err(RejectReason::QtyAboveMax {
            qty: order.quantity,
            max: rules.max_qty,
        });
    }

    // Step alignment is measured from min_qty when the exchange sets one.
    if rules.step_size > Decimal::ZERO {
        let base = if rules.min_qty > Decimal::ZERO {
            rules.min_qty
        } else {
            Decimal::ZERO
        };
        if !((order.quantity - base) % rules.step_size).is_zero() {
            return Err(RejectReason::QtyOffStep {
                qty: order.quantity,
                step: rules.step_size,
                base,
            });
        }
    }

    if check_price {
        let notional = order.notional();
        if (rules.min_notional > Decimal::ZERO) && (notional < rules.min_notional) {
            return Err(RejectReason::BelowMinNotional {
                notional,
                min: rules.min_notional,
            });
        }
    }

    Ok(())
}

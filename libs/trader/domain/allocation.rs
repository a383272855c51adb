//! Budget allocation.
//!
//! Turns a free quote-currency amount into discrete per-symbol buy
//! orders, and a free base-asset amount into discrete sell orders.
//! Both splits are deterministic; the buy split is fair with respect to
//! existing open-order pressure.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A symbol competing for a share of the buy budget.
#[derive(Debug, Clone)]
pub struct BuyCandidate {
    pub symbol: String,
    /// Orders already resting on the exchange for this symbol.
    pub open_orders: usize,
    /// Tie-break weight among symbols with equal pressure; higher wins.
    pub weight: f64,
}

impl BuyCandidate {
    pub fn new(symbol: impl Into<String>, open_orders: usize, weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            open_orders,
            weight,
        }
    }
}

/// Distribute `budget` across `candidates`, one minimum-sized order at a
/// time, always serving the symbols tied for the fewest (existing plus
/// newly allocated) open orders first.
///
/// Each order takes the full minimum, unless fewer than two minimums
/// remain, in which case the entire remainder goes into that one final
/// order. The sum of all allocated amounts therefore equals the budget
/// exactly whenever at least one order is placed.
///
/// Returns symbol → amounts in placement order; empty when there are no
/// candidates or the budget cannot cover one minimum order.
pub fn split_buy_budget(
    budget: Decimal,
    min_order: Decimal,
    candidates: &[BuyCandidate],
) -> HashMap<String, Vec<Decimal>> {
    let mut allocations: HashMap<String, Vec<Decimal>> = HashMap::new();
    if candidates.is_empty() || min_order <= Decimal::ZERO || budget < min_order {
        return allocations;
    }

    let two_minimums = min_order * Decimal::TWO;
    let mut counts: Vec<usize> = candidates.iter().map(|c| c.open_orders).collect();
    let mut remaining = budget;

    while remaining >= min_order {
        // Symbols tied for the lowest pressure, served in weight order.
        let lowest = counts.iter().copied().min().expect("candidates not empty");
        let mut tied: Vec<usize> = (0..candidates.len())
            .filter(|&i| counts[i] == lowest)
            .collect();
        tied.sort_by(|&a, &b| {
            candidates[b]
                .weight
                .partial_cmp(&candidates[a].weight)
                .unwrap_or(Ordering::Equal)
        });

        for idx in tied {
            if remaining < min_order {
                break;
            }
            let amount = if remaining < two_minimums {
                remaining
            } else {
                min_order
            };
            allocations
                .entry(candidates[idx].symbol.clone())
                .or_default()
                .push(amount);
            counts[idx] += 1;
            remaining -= amount;
        }
    }

    allocations
}

/// Split a free base-asset amount into sell-order quantities.
///
/// Works in whole multiples of `step_size`: the minimum order size (in
/// quote terms) converts to a minimum step count, and each order takes
/// the full minimum unless fewer than two minimums of steps remain, in
/// which case the final order absorbs every remaining whole step. The
/// sub-step remainder (dust) is deliberately left unallocated.
pub fn split_sell_budget(
    free_qty: Decimal,
    min_order: Decimal,
    price: Decimal,
    step_size: Decimal,
) -> Vec<Decimal> {
    let mut orders = Vec::new();
    if price <= Decimal::ZERO || step_size <= Decimal::ZERO || min_order <= Decimal::ZERO {
        return orders;
    }

    let mut min_steps = (min_order / price / step_size).floor();
    if min_steps <= Decimal::ZERO {
        // Minimum order is worth less than one step; one step is the
        // smallest quantity the exchange will accept anyway.
        min_steps = Decimal::ONE;
    }

    let mut remaining_steps = (free_qty / step_size).floor();
    let two_minimums = min_steps * Decimal::TWO;

    while remaining_steps >= min_steps {
        let take = if remaining_steps < two_minimums {
            remaining_steps
        } else {
            min_steps
        };
        orders.push(take * step_size);
        remaining_steps -= take;
    }

    orders
}

//! Matcher / Execution Engine — translates pending intents into fills
//! (spec.md §4.5).
//!
//! Settlement price policy (spec.md §9 "Open question", resolved): next
//! bar's open when available, current bar's close at the tail of the
//! timeline. This is a fixed policy, not a configuration knob, per the
//! spec's explicit resolution.

use crate::config::Config;
use crate::data::{BarStore, Timeline};
use crate::domain::order_intent::QuantityType;
use crate::domain::position::QTY_EPSILON;
use crate::domain::{Account, Fill, OrderIntent, OrderSide};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Why a validated intent produced no fill. Non-fatal (spec.md §7).
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementRejection {
    NoReferencePrice,
    ZeroQuantityAfterRounding,
    InsufficientCash,
    InsufficientAvailableShares,
}

impl std::fmt::Display for SettlementRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementRejection::NoReferencePrice => write!(f, "no reference price available"),
            SettlementRejection::ZeroQuantityAfterRounding => {
                write!(f, "zero quantity after lot rounding")
            }
            SettlementRejection::InsufficientCash => write!(f, "insufficient cash"),
            SettlementRejection::InsufficientAvailableShares => {
                write!(f, "insufficient available shares")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rejection {
    pub symbol: String,
    pub reason: SettlementRejection,
}

/// Settles every pending intent, in submission order, against `account`.
///
/// `marks` is the current bar's close per symbol, used as the equity basis
/// for weight-typed intents (spec.md §4.5 step 1).
pub fn settle(
    intents: Vec<OrderIntent>,
    account: &mut Account,
    bar_store: &BarStore,
    timeline: &Timeline,
    marks: &HashMap<String, f64>,
    config: &Config,
) -> (Vec<Fill>, Vec<Rejection>) {
    let current_ts = match timeline.current_timestamp() {
        Some(ts) => ts,
        None => return (Vec::new(), Vec::new()),
    };
    let next_ts = timeline.peek_next_timestamp();

    let mut fills = Vec::new();
    let mut rejections = Vec::new();

    for intent in intents {
        let Some((ref_price, settle_ts)) =
            resolve_ref_price(bar_store, &intent.symbol, current_ts, next_ts)
        else {
            rejections.push(Rejection {
                symbol: intent.symbol,
                reason: SettlementRejection::NoReferencePrice,
            });
            continue;
        };

        let equity = account.equity(marks);
        let (side, raw_qty) = resolve_side_and_quantity(&intent, account, ref_price, equity, config);

        let Some(raw_qty) = raw_qty else {
            rejections.push(Rejection {
                symbol: intent.symbol,
                reason: SettlementRejection::ZeroQuantityAfterRounding,
            });
            continue;
        };

        let lot = config.lot_size_f64();
        let mut qty = (raw_qty / lot).floor() * lot;
        if qty <= QTY_EPSILON {
            rejections.push(Rejection {
                symbol: intent.symbol,
                reason: SettlementRejection::ZeroQuantityAfterRounding,
            });
            continue;
        }

        let slippage_frac = config.slippage_bps / 10_000.0;
        let effective_price = ref_price * (1.0 + side.sign() * slippage_frac);

        match side {
            OrderSide::Buy => {
                loop {
                    let trade_value = effective_price * qty;
                    let commission = (trade_value * config.commission_rate).max(config.min_commission);
                    if account.cash >= trade_value + commission {
                        break;
                    }
                    qty -= lot;
                    if qty <= QTY_EPSILON {
                        break;
                    }
                }
                if qty <= QTY_EPSILON {
                    rejections.push(Rejection {
                        symbol: intent.symbol,
                        reason: SettlementRejection::InsufficientCash,
                    });
                    continue;
                }
            }
            OrderSide::Sell => {
                let available = account
                    .get_position(&intent.symbol)
                    .map(|p| p.available_qty)
                    .unwrap_or(0.0);
                if qty > available {
                    qty = (available / lot).floor() * lot;
                }
                if qty <= QTY_EPSILON {
                    rejections.push(Rejection {
                        symbol: intent.symbol,
                        reason: SettlementRejection::InsufficientAvailableShares,
                    });
                    continue;
                }
            }
        }

        let trade_value = effective_price * qty;
        let commission = (trade_value * config.commission_rate).max(config.min_commission);
        let stamp_tax = match side {
            OrderSide::Buy => 0.0,
            OrderSide::Sell => trade_value * config.stamp_tax_rate,
        };

        apply_fill(
            account,
            &intent.symbol,
            side,
            qty,
            effective_price,
            commission,
            stamp_tax,
            config.is_t0(&intent.symbol),
        );

        tracing::debug!(
            symbol = %intent.symbol,
            side = ?side,
            qty,
            price = effective_price,
            "fill"
        );

        fills.push(Fill {
            symbol: intent.symbol,
            side,
            filled_quantity: qty,
            price: effective_price,
            commission,
            stamp_tax,
            timestamp: settle_ts,
        });
    }

    (fills, rejections)
}

fn resolve_side_and_quantity(
    intent: &OrderIntent,
    account: &Account,
    ref_price: f64,
    equity: f64,
    config: &Config,
) -> (OrderSide, Option<f64>) {
    match intent.quantity_type {
        QuantityType::Count => (intent.side, Some(intent.quantity)),
        QuantityType::Weight => {
            let target_value = intent.quantity * equity;
            let current_qty = account
                .get_position(&intent.symbol)
                .map(|p| p.qty)
                .unwrap_or(0.0);
            let current_value = current_qty * ref_price;
            let delta_value = target_value - current_value;

            if delta_value.abs() < 1e-9 {
                return (OrderSide::Buy, None);
            }
            if delta_value > 0.0 {
                let slippage_frac = config.slippage_bps / 10_000.0;
                let shares = delta_value / (ref_price * (1.0 + slippage_frac));
                (OrderSide::Buy, Some(shares))
            } else {
                let shares = delta_value.abs() / ref_price;
                (OrderSide::Sell, Some(shares))
            }
        }
    }
}

fn apply_fill(
    account: &mut Account,
    symbol: &str,
    side: OrderSide,
    qty: f64,
    price: f64,
    commission: f64,
    stamp_tax: f64,
    t0: bool,
) {
    let trade_value = price * qty;
    match side {
        OrderSide::Buy => {
            account.cash -= trade_value + commission;
            account.total_commission += commission;
            account.position_mut(symbol).apply_buy(qty, price, t0);
        }
        OrderSide::Sell => {
            account.cash += trade_value - commission - stamp_tax;
            account.total_commission += commission;
            account.total_stamp_tax += stamp_tax;
            let avg_cost = account.position_mut(symbol).avg_cost;
            account.realized_pnl += (price - avg_cost) * qty - commission - stamp_tax;
            account.position_mut(symbol).apply_sell(qty);
            account.prune_flat();
        }
    }
}

/// Next bar's open when available, else the last known close at or before
/// the current timestamp (covers both the tail-of-timeline fallback and
/// per-symbol gaps against the benchmark clock).
fn resolve_ref_price(
    bar_store: &BarStore,
    symbol: &str,
    current_ts: DateTime<Utc>,
    next_ts: Option<DateTime<Utc>>,
) -> Option<(f64, DateTime<Utc>)> {
    if let Some(next_ts) = next_ts {
        if let Some(bar) = bar_store.get_bar_at(symbol, next_ts) {
            return Some((bar.open, next_ts));
        }
    }
    bar_store
        .last_close_at_or_before(symbol, current_ts)
        .map(|close| (close, current_ts))
}

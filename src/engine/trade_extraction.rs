//! FIFO round-trip trade extraction from the fill log (spec.md §4.8,
//! §8 invariant 8).

use crate::domain::{Fill, OrderSide, TradeRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

struct OpenLot {
    qty: f64,
    price: f64,
    timestamp: DateTime<Utc>,
}

/// Pairs buys and sells FIFO per symbol, producing one `TradeRecord` per
/// matched (partial or whole) lot. A single sell fill that closes several
/// buy lots yields several trade records. `bar_index_of` maps a fill's
/// settlement timestamp to its position in the benchmark timeline, for
/// `bars_held`.
pub fn extract_trades(fills: &[Fill], bar_index_of: &HashMap<DateTime<Utc>, usize>) -> Vec<TradeRecord> {
    let mut open_lots: HashMap<String, Vec<OpenLot>> = HashMap::new();
    let mut trades = Vec::new();

    for fill in fills {
        match fill.side {
            OrderSide::Buy => {
                open_lots
                    .entry(fill.symbol.clone())
                    .or_default()
                    .push(OpenLot {
                        qty: fill.filled_quantity,
                        price: fill.price,
                        timestamp: fill.timestamp,
                    });
            }
            OrderSide::Sell => {
                let Some(lots) = open_lots.get_mut(&fill.symbol) else {
                    continue;
                };
                let mut remaining = fill.filled_quantity;
                while remaining > 1e-9 {
                    let Some(lot) = lots.first_mut() else {
                        break;
                    };
                    let matched_qty = remaining.min(lot.qty);
                    let allocation = matched_qty / fill.filled_quantity;
                    let commission = fill.commission * allocation;
                    let stamp_tax = fill.stamp_tax * allocation;
                    let gross_pnl = (fill.price - lot.price) * matched_qty;
                    let net_pnl = gross_pnl - commission - stamp_tax;
                    let entry_index = bar_index_of.get(&lot.timestamp).copied().unwrap_or(0);
                    let exit_index = bar_index_of.get(&fill.timestamp).copied().unwrap_or(0);

                    trades.push(TradeRecord {
                        symbol: fill.symbol.clone(),
                        entry_timestamp: lot.timestamp,
                        entry_price: lot.price,
                        exit_timestamp: fill.timestamp,
                        exit_price: fill.price,
                        quantity: matched_qty,
                        gross_pnl,
                        commission,
                        stamp_tax,
                        net_pnl,
                        bars_held: exit_index.saturating_sub(entry_index),
                    });

                    remaining -= matched_qty;
                    lot.qty -= matched_qty;
                    if lot.qty <= 1e-9 {
                        lots.remove(0);
                    }
                }
            }
        }
    }

    trades
}

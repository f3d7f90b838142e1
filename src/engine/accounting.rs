//! Portfolio / Account bookkeeping that spans bars: mark-to-market and the
//! equity curve (spec.md §4.6).

use crate::data::BarStore;
use crate::domain::Account;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Current bar's close for every symbol with an open position; falls back
/// to the last known close if the symbol has no bar at the current
/// timestamp (void-bar carry-forward, spec.md §4.6).
pub fn mark_to_market(
    account: &Account,
    bar_store: &BarStore,
    current_timestamp: DateTime<Utc>,
) -> HashMap<String, f64> {
    account
        .positions
        .keys()
        .filter_map(|symbol| {
            bar_store
                .last_close_at_or_before(symbol, current_timestamp)
                .map(|close| (symbol.clone(), close))
        })
        .collect()
}

/// Appends `(current_timestamp, equity)` once per bar, after settlement
/// (spec.md §4.6 "record_equity").
pub fn record_equity(
    curve: &mut Vec<EquityPoint>,
    account: &Account,
    marks: &HashMap<String, f64>,
    timestamp: DateTime<Utc>,
) {
    let equity = account.equity(marks);
    tracing::debug!(%timestamp, equity, "bar equity mark");
    curve.push(EquityPoint { timestamp, equity });
}

//! TradeRecord — a completed round-trip (buy-then-sell) for one symbol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A closed round-trip trade, produced by FIFO-pairing fills per symbol
/// (spec.md §4.8, §8 invariant 8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_timestamp: DateTime<Utc>,
    pub exit_price: f64,
    pub quantity: f64,
    pub gross_pnl: f64,
    pub commission: f64,
    pub stamp_tax: f64,
    pub net_pnl: f64,
    pub bars_held: usize,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

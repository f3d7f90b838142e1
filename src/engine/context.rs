//! The `Context` snapshot and `OrderHelper` handle passed to strategy
//! callbacks (spec.md §3 "Ownership", §6 "Context surface", §9 "Caching
//! per bar").

use super::calendar::{self, Frequency};
use super::state_bag::StateBag;
use crate::data::BarStore;
use crate::domain::{Bar, OrderIntent, OrderSide};
use crate::indicators::IndicatorEngine;
use crate::orders::PendingOrderBook;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A read-only view of one symbol's position, part of the per-bar
/// `Context` snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PositionView {
    pub qty: f64,
    pub available: f64,
    pub weight: f64,
    pub avg_cost: f64,
}

/// Why an intent enqueued through `OrderHelper` or rejected at settlement
/// never produced a fill (spec.md §7 "Intent rejection").
#[derive(Debug, Clone)]
pub struct RejectionRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub reason: String,
}

/// Enqueues intents into the pending order book; never mutates the account
/// directly (spec.md §5 "Shared resource policy").
pub struct OrderHelper<'a> {
    book: &'a mut PendingOrderBook,
    bar_store: &'a BarStore,
    rejections: &'a mut Vec<RejectionRecord>,
    timestamp: DateTime<Utc>,
}

impl<'a> OrderHelper<'a> {
    fn submit(&mut self, intent: OrderIntent) {
        let symbol = intent.symbol.clone();
        if let Err(reason) = self.book.add_order(intent, self.bar_store) {
            self.rejections.push(RejectionRecord {
                timestamp: self.timestamp,
                symbol,
                reason: reason.to_string(),
            });
        }
    }

    pub fn buy(&mut self, symbol: impl Into<String>, quantity: f64) {
        self.submit(OrderIntent::count(symbol, OrderSide::Buy, quantity));
    }

    pub fn sell(&mut self, symbol: impl Into<String>, quantity: f64) {
        self.submit(OrderIntent::count(symbol, OrderSide::Sell, quantity));
    }

    /// Enqueues one weight-typed intent per `(symbol, target_weight)` pair;
    /// the matcher resolves buy vs. sell by comparing target to current
    /// value (spec.md §4.4 "target", §9).
    pub fn target(&mut self, weights: &HashMap<String, f64>) {
        for (symbol, &weight) in weights {
            self.submit(OrderIntent::weight(symbol.clone(), weight));
        }
    }
}

/// Per-bar read-mostly snapshot handed to `on_bar`/`on_trade`/`on_stop`.
///
/// Cash/equity/positions/bars are batched once per bar and never mutated
/// by strategy code — the strategy must not retain this across bars
/// (spec.md §5, §9 "Caching per bar").
pub struct Context<'a> {
    pub datetime: DateTime<Utc>,
    pub symbols: Vec<String>,
    pub cash: f64,
    pub equity: f64,
    pub positions: HashMap<String, PositionView>,
    pub bars: HashMap<String, Bar>,
    pub state: &'a mut StateBag,
    pub order: OrderHelper<'a>,
    bar_store: &'a BarStore,
    indicator_engine: &'a IndicatorEngine,
    current_index: usize,
}

impl<'a> Context<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        datetime: DateTime<Utc>,
        symbols: Vec<String>,
        cash: f64,
        equity: f64,
        positions: HashMap<String, PositionView>,
        bars: HashMap<String, Bar>,
        state: &'a mut StateBag,
        bar_store: &'a BarStore,
        indicator_engine: &'a IndicatorEngine,
        current_index: usize,
        book: &'a mut PendingOrderBook,
        rejections: &'a mut Vec<RejectionRecord>,
    ) -> Self {
        let order = OrderHelper {
            book,
            bar_store,
            rejections,
            timestamp: datetime,
        };
        Self {
            datetime,
            symbols,
            cash,
            equity,
            positions,
            bars,
            state,
            order,
            bar_store,
            indicator_engine,
            current_index,
        }
    }

    /// Last `count` bars at or before the current timestamp (spec.md §4.1).
    pub fn get_bars(&self, symbol: &str, count: usize) -> &[Bar] {
        self.bar_store.get_bars(symbol, count, self.datetime)
    }

    /// Most recent value of a registered indicator, or `None` if undefined
    /// (spec.md §4.3, default `count=1`).
    pub fn get_indicator_value(&self, name: &str, symbol: &str) -> Option<f64> {
        self.indicator_engine.get_value(name, symbol, self.current_index)
    }

    /// Last `count` values of a registered indicator, oldest-first.
    pub fn get_indicator_values_n(&self, name: &str, symbol: &str, count: usize) -> Vec<f64> {
        self.indicator_engine
            .get_values(name, symbol, self.current_index, count)
    }

    /// Most recent value for each named indicator on one symbol.
    pub fn get_indicator_values(&self, symbol: &str, names: &[&str]) -> HashMap<String, Option<f64>> {
        names
            .iter()
            .map(|&name| (name.to_string(), self.get_indicator_value(name, symbol)))
            .collect()
    }

    /// True if `symbol` has a bar at the current timestamp.
    pub fn is_tradable(&self, symbol: &str) -> bool {
        self.bars.contains_key(symbol)
    }

    pub fn is_rebalance_day(&self, frequency: Frequency, last: DateTime<Utc>) -> bool {
        calendar::is_rebalance_day(frequency, self.datetime, last)
    }
}

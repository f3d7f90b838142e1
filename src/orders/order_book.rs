//! Order Book (pending) — FIFO intents submitted during `on_bar`, flushed
//! at end of bar (spec.md §4.4).

use crate::data::BarStore;
use crate::domain::order_intent::QuantityType;
use crate::domain::OrderIntent;

/// Why an intent never reached the matcher. Non-fatal (spec.md §7).
#[derive(Debug, Clone, PartialEq)]
pub enum IntentRejection {
    NonPositiveQuantity,
    UnknownSymbol,
}

impl std::fmt::Display for IntentRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentRejection::NonPositiveQuantity => write!(f, "quantity must be > 0"),
            IntentRejection::UnknownSymbol => write!(f, "symbol not present in bar store"),
        }
    }
}

/// A FIFO queue of validated pending intents, cleared at end-of-bar
/// settlement.
#[derive(Default)]
pub struct PendingOrderBook {
    intents: Vec<OrderIntent>,
}

impl PendingOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `quantity > 0` and that `symbol` is known to the bar
    /// store; `side`/`quantity_type` are always valid by construction
    /// (Rust enums admit no other variants).
    pub fn add_order(
        &mut self,
        intent: OrderIntent,
        bar_store: &BarStore,
    ) -> Result<(), IntentRejection> {
        if intent.quantity_type == QuantityType::Count && intent.quantity <= 0.0 {
            tracing::warn!(symbol = %intent.symbol, "intent rejected: non-positive quantity");
            return Err(IntentRejection::NonPositiveQuantity);
        }
        if intent.quantity_type == QuantityType::Weight && !(0.0..=1.0).contains(&intent.quantity) {
            tracing::warn!(symbol = %intent.symbol, weight = intent.quantity, "intent rejected: weight out of [0,1]");
            return Err(IntentRejection::NonPositiveQuantity);
        }
        if bar_store.series_for(&intent.symbol).is_none() {
            tracing::warn!(symbol = %intent.symbol, "intent rejected: unknown symbol");
            return Err(IntentRejection::UnknownSymbol);
        }
        self.intents.push(intent);
        Ok(())
    }

    /// Drains the book in submission order, for end-of-bar settlement
    /// (spec.md §5 "Intents submitted during on_bar are settled in
    /// submission order within the same bar").
    pub fn take_all(&mut self) -> Vec<OrderIntent> {
        std::mem::take(&mut self.intents)
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::parse_timestamp;
    use crate::domain::{Bar, OrderSide};

    fn store_with_symbol(symbol: &str) -> BarStore {
        let mut store = BarStore::new();
        store
            .add_market_data(
                symbol,
                vec![Bar {
                    symbol: symbol.to_string(),
                    timestamp: parse_timestamp("2024-01-01").unwrap(),
                    open: 10.0,
                    high: 10.0,
                    low: 10.0,
                    close: 10.0,
                    volume: 0.0,
                }],
            )
            .unwrap();
        store
    }

    #[test]
    fn rejects_unknown_symbol() {
        let store = store_with_symbol("A");
        let mut book = PendingOrderBook::new();
        let result = book.add_order(OrderIntent::count("B", OrderSide::Buy, 100.0), &store);
        assert_eq!(result, Err(IntentRejection::UnknownSymbol));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let store = store_with_symbol("A");
        let mut book = PendingOrderBook::new();
        let result = book.add_order(OrderIntent::count("A", OrderSide::Buy, 0.0), &store);
        assert_eq!(result, Err(IntentRejection::NonPositiveQuantity));
    }

    #[test]
    fn take_all_drains_in_submission_order() {
        let store = store_with_symbol("A");
        let mut book = PendingOrderBook::new();
        book.add_order(OrderIntent::count("A", OrderSide::Buy, 100.0), &store)
            .unwrap();
        book.add_order(OrderIntent::count("A", OrderSide::Sell, 50.0), &store)
            .unwrap();
        let drained = book.take_all();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].side, OrderSide::Buy);
        assert_eq!(drained[1].side, OrderSide::Sell);
        assert!(book.is_empty());
    }
}

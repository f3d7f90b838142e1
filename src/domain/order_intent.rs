//! OrderIntent — a pending order enqueued by the strategy during `on_bar`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

/// How `quantity` on an intent should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityType {
    /// A literal share count (rounded down to the nearest lot).
    Count,
    /// A target portfolio weight in `[0, 1]`; the matcher resolves buy vs.
    /// sell by comparing target value to current value — `side` is
    /// advisory only for this variant (spec.md §9 "Intent target weight
    /// semantics").
    Weight,
}

/// An order enqueued during `on_bar`, consumed at end-of-bar settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub quantity_type: QuantityType,
}

impl OrderIntent {
    pub fn count(symbol: impl Into<String>, side: OrderSide, quantity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            quantity_type: QuantityType::Count,
        }
    }

    pub fn weight(symbol: impl Into<String>, target_weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Buy,
            quantity: target_weight,
            quantity_type: QuantityType::Weight,
        }
    }
}

//! Fill — a completed order execution emitted by the matcher.

use super::order_intent::OrderSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: String,
    pub side: OrderSide,
    pub filled_quantity: f64,
    pub price: f64,
    pub commission: f64,
    pub stamp_tax: f64,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    /// Net cash effect: negative for buys (cash outflow), positive for sells.
    pub fn cash_delta(&self) -> f64 {
        let trade_value = self.price * self.filled_quantity;
        match self.side {
            OrderSide::Buy => -(trade_value + self.commission),
            OrderSide::Sell => trade_value - self.commission - self.stamp_tax,
        }
    }
}

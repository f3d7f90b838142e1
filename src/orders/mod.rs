//! Order book: pending intents awaiting end-of-bar settlement.

pub mod order_book;

pub use order_book::{IntentRejection, PendingOrderBook};

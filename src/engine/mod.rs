//! The event engine: per-bar settlement, accounting, trade extraction, and
//! the scheduler that drives a strategy across a benchmark timeline.

pub mod accounting;
pub mod calendar;
pub mod context;
pub mod matcher;
pub mod scheduler;
pub mod start_context;
pub mod state_bag;
pub mod trade_extraction;

pub use accounting::{mark_to_market, record_equity, EquityPoint};
pub use calendar::{is_rebalance_day, Frequency};
pub use context::{Context, OrderHelper, PositionView, RejectionRecord};
pub use matcher::{Rejection as SettlementRejectionRecord, SettlementRejection};
pub use scheduler::{Engine, RunResult};
pub use start_context::StartContext;
pub use state_bag::{StateBag, StateValue};
pub use trade_extraction::extract_trades;

//! Engine error types.
//!
//! Mirrors spec.md §7: configuration and data errors are fatal and raised
//! before/at load time; strategy exceptions abort a run in progress. Intent
//! rejections and indicator gaps are deliberately *not* modeled here — they
//! are non-fatal and recorded into `RunResult` instead (see `engine::context`
//! and `indicators`).

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("data error in symbol {symbol:?} at index {index}: {reason}")]
    Data {
        symbol: String,
        index: usize,
        reason: String,
    },

    #[error("strategy callback failed at bar {bar_index} ({timestamp}): {reason}")]
    Strategy {
        bar_index: usize,
        timestamp: DateTime<Utc>,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;

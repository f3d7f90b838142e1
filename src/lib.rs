//! `tradebench-core` — an event-driven, bar-by-bar backtesting engine for
//! equity/ETF strategies on a single discrete-time benchmark clock.
//!
//! Loads per-symbol OHLCV history and a benchmark bar series, precomputes
//! any strategy-registered indicators, then drives a user-supplied
//! [`Strategy`] bar by bar: settling its pending order intents against
//! commission, slippage, stamp tax, T+1 availability, and lot-size
//! rounding, marking the portfolio to market, and finally producing an
//! equity curve, a trade log, and a performance statistics summary.

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod orders;
pub mod stats;
pub mod strategy;

pub use config::{BacktestConfig, Config};
pub use engine::{Engine, RunResult};
pub use error::{EngineError, Result};
pub use strategy::Strategy;

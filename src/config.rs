//! Backtest configuration (spec.md §6 "Configuration").

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Recognized backtest options. All fields are optional on the wire form
/// (`BacktestConfig`); `Config::build` fills in defaults and validates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub cash: Option<f64>,
    pub commission_rate: Option<f64>,
    pub min_commission: Option<f64>,
    pub slippage_bps: Option<f64>,
    pub stamp_tax_rate: Option<f64>,
    pub t0_symbols: Option<HashSet<String>>,
    /// Hint for bars-per-year inference (e.g. 252 for daily). Auto-inferred
    /// from the benchmark timeline's median timestamp delta when absent.
    pub period: Option<f64>,
    pub lot_size: Option<u32>,
}

impl BacktestConfig {
    /// Validate and fill in defaults, producing the engine's working config.
    pub fn build(self) -> Result<Config, EngineError> {
        let cash = self.cash.unwrap_or(100_000.0);
        if cash < 0.0 {
            return Err(EngineError::Config(format!(
                "cash must be non-negative, got {cash}"
            )));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(EngineError::Config(format!(
                    "end ({end}) precedes start ({start})"
                )));
            }
        }
        let commission_rate = self.commission_rate.unwrap_or(0.0005);
        if commission_rate < 0.0 {
            return Err(EngineError::Config("commission_rate must be >= 0".into()));
        }
        let min_commission = self.min_commission.unwrap_or(5.0);
        if min_commission < 0.0 {
            return Err(EngineError::Config("min_commission must be >= 0".into()));
        }
        let slippage_bps = self.slippage_bps.unwrap_or(1.0);
        let stamp_tax_rate = self.stamp_tax_rate.unwrap_or(0.001);
        if stamp_tax_rate < 0.0 {
            return Err(EngineError::Config("stamp_tax_rate must be >= 0".into()));
        }
        let lot_size = self.lot_size.unwrap_or(100);
        if lot_size == 0 {
            return Err(EngineError::Config("lot_size must be >= 1".into()));
        }
        if let Some(period) = self.period {
            if period <= 0.0 {
                return Err(EngineError::Config("period must be > 0 when given".into()));
            }
        }

        Ok(Config {
            start: self.start,
            end: self.end,
            cash,
            commission_rate,
            min_commission,
            slippage_bps,
            stamp_tax_rate,
            t0_symbols: self.t0_symbols.unwrap_or_default(),
            period: self.period,
            lot_size,
        })
    }
}

/// Validated, defaulted configuration the engine operates on.
#[derive(Debug, Clone)]
pub struct Config {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub cash: f64,
    pub commission_rate: f64,
    pub min_commission: f64,
    pub slippage_bps: f64,
    pub stamp_tax_rate: f64,
    pub t0_symbols: HashSet<String>,
    pub period: Option<f64>,
    pub lot_size: u32,
}

impl Config {
    pub fn is_t0(&self, symbol: &str) -> bool {
        self.t0_symbols.contains(symbol)
    }

    pub fn lot_size_f64(&self) -> f64 {
        self.lot_size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = BacktestConfig::default().build().unwrap();
        assert_eq!(config.cash, 100_000.0);
        assert_eq!(config.commission_rate, 0.0005);
        assert_eq!(config.min_commission, 5.0);
        assert_eq!(config.slippage_bps, 1.0);
        assert_eq!(config.stamp_tax_rate, 0.001);
        assert_eq!(config.lot_size, 100);
        assert!(config.t0_symbols.is_empty());
    }

    #[test]
    fn negative_cash_is_rejected() {
        let raw = BacktestConfig {
            cash: Some(-1.0),
            ..Default::default()
        };
        assert!(raw.build().is_err());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let raw = BacktestConfig {
            start: crate::domain::bar::parse_timestamp("2024-02-01"),
            end: crate::domain::bar::parse_timestamp("2024-01-01"),
            ..Default::default()
        };
        assert!(raw.build().is_err());
    }

    #[test]
    fn t0_symbols_carried_through() {
        let mut set = HashSet::new();
        set.insert("510300.SH".to_string());
        let raw = BacktestConfig {
            t0_symbols: Some(set),
            ..Default::default()
        };
        let config = raw.build().unwrap();
        assert!(config.is_t0("510300.SH"));
        assert!(!config.is_t0("600000.SH"));
    }
}

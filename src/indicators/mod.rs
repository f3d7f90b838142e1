//! Indicator Registry & Engine (spec.md §4.3): built-in SMA/RSI plus an
//! extensibility tag for user-defined indicators, precomputed once per
//! (indicator, symbol) pair after `on_start`.

pub mod custom;
pub mod rsi;
pub mod sma;

pub use custom::CustomIndicator;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::data::BarStore;
use crate::domain::Bar;
use std::collections::HashMap;

/// Which OHLCV column a built-in indicator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    pub fn value(self, bar: &Bar) -> f64 {
        match self {
            Field::Open => bar.open,
            Field::High => bar.high,
            Field::Low => bar.low,
            Field::Close => bar.close,
            Field::Volume => bar.volume,
        }
    }
}

/// A registered indicator definition: computes one aligned value series
/// from a symbol's full bar history.
///
/// `compute` is called once per symbol at precompute time and must return
/// a vector the same length as `bars`, with `f64::NAN` for any index before
/// `lookback()` is satisfied (spec.md §3 "IndicatorSeries").
pub trait Indicator: Send + Sync {
    fn lookback(&self) -> usize;
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Registers indicator specs by name; duplicate names overwrite (with a
/// `tracing::warn!`, per SPEC_FULL.md's logging section) rather than erroring
/// — registration itself never computes anything (spec.md §4.3).
#[derive(Default)]
pub struct IndicatorRegistry {
    specs: HashMap<String, Box<dyn Indicator>>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, indicator: Box<dyn Indicator>) {
        let name = name.into();
        if self.specs.contains_key(&name) {
            tracing::warn!(indicator = %name, "duplicate indicator registration; overwriting");
        }
        self.specs.insert(name, indicator);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }
}

/// Precomputed (indicator_name, symbol) -> aligned value series, in full
/// precision (rounding to 4 decimals happens only at the `Context`
/// read boundary, per spec.md §4.3).
#[derive(Default)]
pub struct IndicatorEngine {
    series: HashMap<(String, String), Vec<f64>>,
}

impl IndicatorEngine {
    /// Runs once, serially, over every (indicator, symbol) pair
    /// (spec.md §5 "Indicator precomputation").
    pub fn precompute(registry: &IndicatorRegistry, bar_store: &BarStore) -> Self {
        let mut series = HashMap::new();
        for name in registry.names() {
            let indicator = &registry.specs[name];
            for symbol in bar_store.symbols() {
                let bars = bar_store.series_for(symbol).unwrap_or(&[]);
                let values = indicator.compute(bars);
                series.insert((name.to_string(), symbol.to_string()), values);
            }
        }
        Self { series }
    }

    /// Last `count` values at or before `up_to_index` (inclusive), rounded
    /// to 4 decimals, oldest-first; `NaN` entries are absent, not returned
    /// as a sentinel in-place (spec.md §4.3, SPEC_FULL.md point 6).
    pub fn get_values(&self, name: &str, symbol: &str, up_to_index: usize, count: usize) -> Vec<f64> {
        let Some(values) = self.series.get(&(name.to_string(), symbol.to_string())) else {
            return Vec::new();
        };
        let end = (up_to_index + 1).min(values.len());
        let start = end.saturating_sub(count);
        values[start..end]
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .map(round4)
            .collect()
    }

    /// Single most-recent value at or before `up_to_index`, or `None` if
    /// undefined (spec.md §4.3 default `count=1`).
    pub fn get_value(&self, name: &str, symbol: &str, up_to_index: usize) -> Option<f64> {
        self.get_values(name, symbol, up_to_index, 1).pop()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
pub(crate) fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use crate::domain::bar::parse_timestamp;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            symbol: "TEST".into(),
            timestamp: parse_timestamp(&format!("2024-01-{:02}", i + 1)).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual}"
    );
}

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-9;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precompute_and_lookup() {
        let mut store = BarStore::new();
        store
            .add_market_data("TEST", make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]))
            .unwrap();
        let mut registry = IndicatorRegistry::new();
        registry.register("sma3", Box::new(Sma::new(3, Field::Close)));
        let engine = IndicatorEngine::precompute(&registry, &store);
        assert!(engine.get_value("sma3", "TEST", 0).is_none());
        let value = engine.get_value("sma3", "TEST", 2).unwrap();
        assert_approx(value, 11.0, DEFAULT_EPSILON);
    }

    #[test]
    fn duplicate_registration_overwrites() {
        let mut registry = IndicatorRegistry::new();
        registry.register("sma", Box::new(Sma::new(3, Field::Close)));
        registry.register("sma", Box::new(Sma::new(5, Field::Close)));
        assert_eq!(registry.names().count(), 1);
    }
}

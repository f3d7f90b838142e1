//! Bar Store — per-symbol, time-sorted bar arrays with forward-aligned
//! last-N lookups (spec.md §4.1).

use crate::domain::{Bar, BarError};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::HashMap;

/// Caches the result of the last `get_bars` call for a symbol so repeated
/// calls within the same bar (same `current_timestamp`) are O(1).
#[derive(Debug, Clone, Copy)]
struct LookupCache {
    timestamp: DateTime<Utc>,
    end_index: usize,
}

/// Per-symbol, time-sorted, append-only bar arrays.
pub struct BarStore {
    series: HashMap<String, Vec<Bar>>,
    cache: RefCell<HashMap<String, LookupCache>>,
}

impl BarStore {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Load one symbol's bars. Sorts defensively, then validates strictly
    /// increasing timestamps and OHLC sanity (spec.md §3 "SymbolSeries").
    pub fn add_market_data(&mut self, symbol: &str, mut bars: Vec<Bar>) -> Result<(), BarError> {
        bars.sort_by_key(|b| b.timestamp);
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BarError::InsaneOhlc {
                    symbol: symbol.to_string(),
                    index,
                });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(BarError::NonMonotonic {
                    symbol: symbol.to_string(),
                    index,
                });
            }
        }
        self.series.insert(symbol.to_string(), bars);
        Ok(())
    }

    /// Restrict every loaded series to an inclusive `[start, end]` window.
    pub fn apply_window(&mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) {
        if start.is_none() && end.is_none() {
            return;
        }
        for bars in self.series.values_mut() {
            bars.retain(|bar| {
                start.map_or(true, |s| bar.timestamp >= s) && end.map_or(true, |e| bar.timestamp <= e)
            });
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn series_for(&self, symbol: &str) -> Option<&[Bar]> {
        self.series.get(symbol).map(Vec::as_slice)
    }

    /// Returns the last `count` bars at or before `current_timestamp`,
    /// oldest-first (newest-last). Empty if the symbol has no bars at or
    /// before that timestamp.
    pub fn get_bars(&self, symbol: &str, count: usize, current_timestamp: DateTime<Utc>) -> &[Bar] {
        let Some(bars) = self.series.get(symbol) else {
            return &[];
        };
        let end_index = self.resolve_end_index(symbol, bars, current_timestamp);
        let start_index = end_index.saturating_sub(count);
        &bars[start_index..end_index]
    }

    /// Exact-timestamp lookup, used by the matcher to find a symbol's bar
    /// at the benchmark's next timestamp (settlement reference price).
    pub fn get_bar_at(&self, symbol: &str, timestamp: DateTime<Utc>) -> Option<&Bar> {
        let bars = self.series.get(symbol)?;
        let index = bars.partition_point(|b| b.timestamp < timestamp);
        bars.get(index).filter(|b| b.timestamp == timestamp)
    }

    /// Last known close at or before `current_timestamp` (void-bar carry
    /// forward used by mark-to-market and the settlement fallback).
    pub fn last_close_at_or_before(&self, symbol: &str, current_timestamp: DateTime<Utc>) -> Option<f64> {
        let bars = self.series.get(symbol)?;
        let end_index = self.resolve_end_index(symbol, bars, current_timestamp);
        bars[..end_index].last().map(|b| b.close)
    }

    fn resolve_end_index(&self, symbol: &str, bars: &[Bar], current_timestamp: DateTime<Utc>) -> usize {
        let mut cache = self.cache.borrow_mut();
        if let Some(hit) = cache.get(symbol) {
            if hit.timestamp == current_timestamp {
                return hit.end_index;
            }
        }
        let end_index = bars.partition_point(|b| b.timestamp <= current_timestamp);
        cache.insert(
            symbol.to_string(),
            LookupCache {
                timestamp: current_timestamp,
                end_index,
            },
        );
        end_index
    }
}

impl Default for BarStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::parse_timestamp;

    fn bar(symbol: &str, date: &str, close: f64) -> Bar {
        let ts = parse_timestamp(date).unwrap();
        Bar {
            symbol: symbol.to_string(),
            timestamp: ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn get_bars_returns_last_n_at_or_before_timestamp() {
        let mut store = BarStore::new();
        store
            .add_market_data(
                "A",
                vec![
                    bar("A", "2024-01-01", 10.0),
                    bar("A", "2024-01-02", 11.0),
                    bar("A", "2024-01-03", 12.0),
                ],
            )
            .unwrap();
        let ts = parse_timestamp("2024-01-02").unwrap();
        let bars = store.get_bars("A", 2, ts);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 10.0);
        assert_eq!(bars[1].close, 11.0);
    }

    #[test]
    fn get_bars_before_first_bar_is_empty() {
        let mut store = BarStore::new();
        store
            .add_market_data("A", vec![bar("A", "2024-01-05", 10.0)])
            .unwrap();
        let ts = parse_timestamp("2024-01-01").unwrap();
        assert!(store.get_bars("A", 5, ts).is_empty());
    }

    #[test]
    fn non_monotonic_timestamps_rejected() {
        let mut store = BarStore::new();
        let mut bars = vec![bar("A", "2024-01-02", 10.0), bar("A", "2024-01-01", 9.0)];
        // sort_by_key in add_market_data will reorder, so force a duplicate instead
        bars.push(bar("A", "2024-01-01", 9.5));
        let err = store.add_market_data("A", bars);
        assert!(err.is_err());
    }

    #[test]
    fn insane_ohlc_rejected() {
        let mut store = BarStore::new();
        let mut b = bar("A", "2024-01-01", 10.0);
        b.high = 1.0; // below low
        assert!(store.add_market_data("A", vec![b]).is_err());
    }

    #[test]
    fn window_filters_inclusive() {
        let mut store = BarStore::new();
        store
            .add_market_data(
                "A",
                vec![
                    bar("A", "2024-01-01", 10.0),
                    bar("A", "2024-01-02", 11.0),
                    bar("A", "2024-01-03", 12.0),
                ],
            )
            .unwrap();
        store.apply_window(
            parse_timestamp("2024-01-01"),
            parse_timestamp("2024-01-02"),
        );
        assert_eq!(store.series_for("A").unwrap().len(), 2);
    }
}

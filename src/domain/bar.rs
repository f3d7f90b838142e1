//! Bar — the fundamental market data unit, and its timestamp parsing rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BarError {
    #[error("bar {index} for {symbol:?} has an unparseable timestamp {raw:?}")]
    UnparseableTimestamp {
        symbol: String,
        index: usize,
        raw: String,
    },
    #[error("bar {index} for {symbol:?} fails OHLC sanity (low <= {{open, close}} <= high)")]
    InsaneOhlc { symbol: String, index: usize },
    #[error("bars for {symbol:?} are not strictly increasing at index {index}")]
    NonMonotonic { symbol: String, index: usize },
}

/// OHLCV bar for a single symbol at a single timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Basic OHLCV sanity check: low <= {open, close} <= high, low <= high, positive o/c.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}

/// Parses a bar timestamp, trying ISO-8601 forms before naive fallbacks.
///
/// Precedence: trailing `Z` normalized to `+00:00`, then a bare ISO-8601
/// instant/offset form, then `"%Y-%m-%d %H:%M:%S"`, then `"%Y-%m-%d"`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = if let Some(stripped) = raw.strip_suffix('Z') {
        format!("{stripped}+00:00")
    } else {
        raw.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Some(DateTime::from_naive_utc_and_offset(
            date.and_hms_opt(0, 0, 0).unwrap(),
            Utc,
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            symbol: "600000.SH".into(),
            timestamp: parse_timestamp("2024-01-02").unwrap(),
            open: 10.0,
            high: 10.5,
            low: 9.8,
            close: 10.2,
            volume: 1_000.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 9.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar.symbol, deser.symbol);
        assert_eq!(bar.timestamp, deser.timestamp);
        assert_eq!(bar.close, deser.close);
    }

    #[test]
    fn parse_timestamp_z_suffix() {
        let a = parse_timestamp("2024-01-02T09:30:00Z").unwrap();
        let b = parse_timestamp("2024-01-02T09:30:00+00:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_timestamp_naive_datetime() {
        let dt = parse_timestamp("2024-01-02 09:30:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-02 09:30:00");
    }

    #[test]
    fn parse_timestamp_naive_date() {
        let dt = parse_timestamp("2024-01-02").unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("not-a-date").is_none());
    }
}

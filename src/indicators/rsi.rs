//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period + 1 (undefined through i == period inclusive, first
//! defined at i == period + 1 — see SPEC_FULL.md resolved ambiguity #2).
//! Edge cases: avg_loss == 0 and avg_gain == 0 → RSI = 50 (no movement);
//! avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0.

use super::{Field, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    field: Field,
}

impl Rsi {
    pub fn new(period: usize, field: Field) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period, field }
    }
}

impl Indicator for Rsi {
    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 2 {
            return result;
        }

        let value_at = |i: usize| self.field.value(&bars[i]);

        let mut changes = vec![f64::NAN; n];
        for i in 1..n {
            let curr = value_at(i);
            let prev = value_at(i - 1);
            changes[i] = if curr.is_nan() || prev.is_nan() {
                f64::NAN
            } else {
                curr - prev
            };
        }

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[1..=self.period] {
            if ch.is_nan() {
                return result;
            }
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;

        result[self.period + 1] = compute_rsi(avg_gain, avg_loss);

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 2)..n {
            if changes[i].is_nan() {
                for val in result.iter_mut().skip(i) {
                    *val = f64::NAN;
                }
                return result;
            }

            let gain = if changes[i] > 0.0 { changes[i] } else { 0.0 };
            let loss = if changes[i] < 0.0 { -changes[i] } else { 0.0 };

            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

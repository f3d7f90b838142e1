//! Simple Moving Average (SMA).
//!
//! Rolling mean of a configurable field over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::{Field, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    field: Field,
}

impl Sma {
    pub fn new(period: usize, field: Field) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period, field }
    }
}

impl Indicator for Sma {
    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let value_at = |i: usize| self.field.value(&bars[i]);

        let mut sum = 0.0;
        let mut nan_in_window = false;
        for i in 0..self.period {
            let v = value_at(i);
            if v.is_nan() {
                nan_in_window = true;
            }
            sum += v;
        }
        if !nan_in_window {
            result[self.period - 1] = sum / self.period as f64;
        }

        for i in self.period..n {
            let leaving = value_at(i - self.period);
            let entering = value_at(i);
            sum = sum - leaving + entering;

            if entering.is_nan() || leaving.is_nan() || nan_in_window {
                nan_in_window = false;
                sum = 0.0;
                for j in (i + 1 - self.period)..=i {
                    let v = value_at(j);
                    if v.is_nan() {
                        nan_in_window = true;
                    }
                    sum += v;
                }
                if nan_in_window {
                    result[i] = f64::NAN;
                    continue;
                }
            }

            result[i] = sum / self.period as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let sma = Sma::new(5, Field::Close);
        let result = sma.compute(&bars);

        assert_eq!(result.len(), 7);
        for i in 0..4 {
            assert!(result[i].is_nan(), "expected NaN at index {i}");
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let sma = Sma::new(1, Field::Close);
        let result = sma.compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_nan_propagation() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        bars[2].close = f64::NAN;
        let sma = Sma::new(3, Field::Close);
        let result = sma.compute(&bars);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(20, Field::Close).lookback(), 19);
        assert_eq!(Sma::new(1, Field::Close).lookback(), 0);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let sma = Sma::new(5, Field::Close);
        let result = sma.compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_on_volume_field() {
        let mut bars = make_bars(&[10.0, 10.0, 10.0]);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.volume = (i as f64 + 1.0) * 100.0;
        }
        let sma = Sma::new(3, Field::Volume);
        let result = sma.compute(&bars);
        assert_approx(result[2], 200.0, DEFAULT_EPSILON);
    }
}

//! User-defined indicator extensibility tag (spec.md §4.3, §9).
//!
//! A custom indicator is a pure function `(bars_up_to_i) -> scalar`; the
//! engine guarantees it is called once per index, in order, rather than
//! coupling the engine to any specific scripting host.

use super::Indicator;
use crate::domain::Bar;

type IndicatorFn = dyn Fn(&[Bar]) -> f64 + Send + Sync;

pub struct CustomIndicator {
    lookback: usize,
    f: Box<IndicatorFn>,
}

impl CustomIndicator {
    pub fn new(lookback: usize, f: impl Fn(&[Bar]) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            lookback,
            f: Box::new(f),
        }
    }
}

impl Indicator for CustomIndicator {
    fn lookback(&self) -> usize {
        self.lookback
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        (0..bars.len())
            .map(|i| {
                if i < self.lookback {
                    f64::NAN
                } else {
                    (self.f)(&bars[..=i])
                }
            })
            .collect()
    }
}

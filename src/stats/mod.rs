//! Performance statistics, computed once at the end of a run from the
//! equity curve, the fill log, and the FIFO-extracted trade log.

use crate::domain::{Fill, OrderSide, TradeRecord};
use crate::engine::EquityPoint;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The full result summary handed back in `RunResult`.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub max_dd_duration: usize,
    pub max_dd_start: Option<DateTime<Utc>>,
    pub max_dd_end: Option<DateTime<Utc>>,
    pub calmar: f64,
    pub win_rate: f64,
    pub profit_loss_ratio: f64,
    pub open_count: usize,
    pub close_count: usize,
    pub benchmark_return: f64,
    pub benchmark_annualized_return: f64,
    pub benchmark_max_drawdown: f64,
    pub benchmark_max_drawdown_start: Option<DateTime<Utc>>,
    pub benchmark_max_drawdown_end: Option<DateTime<Utc>>,
}

struct Drawdown {
    value: f64,
    start_index: Option<usize>,
    end_index: Option<usize>,
    duration: usize,
}

impl Stats {
    /// `period_override` is the config's `period` hint (bars per year); when
    /// absent, it is inferred from the median gap between equity timestamps.
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[TradeRecord],
        fills: &[Fill],
        benchmark_closes: &[f64],
        period_override: Option<f64>,
    ) -> Stats {
        let values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let timestamps: Vec<DateTime<Utc>> = equity_curve.iter().map(|p| p.timestamp).collect();
        let bars_per_year = period_override.unwrap_or_else(|| infer_bars_per_year(&timestamps));

        let returns = simple_returns(&values);
        let mean_r = mean(&returns);
        let std_r = population_stddev(&returns);

        let total_ret = total_return(&values);
        let ann_ret = annualized_return(&values, bars_per_year);
        let volatility = std_r * bars_per_year.sqrt();
        let sharpe = if std_r > 1e-12 {
            mean_r / std_r * bars_per_year.sqrt()
        } else {
            0.0
        };

        let dd = max_drawdown(&values);
        let calmar = if dd.value > 1e-12 { ann_ret / dd.value } else { 0.0 };

        let wins: Vec<f64> = trades.iter().filter(|t| t.is_winner()).map(|t| t.net_pnl).collect();
        let losses: Vec<f64> = trades
            .iter()
            .filter(|t| !t.is_winner())
            .map(|t| t.net_pnl.abs())
            .collect();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            wins.len() as f64 / trades.len() as f64
        };
        let mean_win = mean(&wins);
        let mean_loss = mean(&losses);
        let profit_loss_ratio = if mean_loss > 1e-12 { mean_win / mean_loss } else { 0.0 };

        let open_count = fills.iter().filter(|f| f.side == OrderSide::Buy).count();
        let close_count = fills.iter().filter(|f| f.side == OrderSide::Sell).count();

        let benchmark_dd = max_drawdown(benchmark_closes);

        Stats {
            total_return: total_ret,
            annualized_return: ann_ret,
            volatility,
            sharpe,
            max_drawdown: dd.value,
            max_dd_duration: dd.duration,
            max_dd_start: dd.start_index.and_then(|i| timestamps.get(i).copied()),
            max_dd_end: dd.end_index.and_then(|i| timestamps.get(i).copied()),
            calmar,
            win_rate,
            profit_loss_ratio,
            open_count,
            close_count,
            benchmark_return: total_return(benchmark_closes),
            benchmark_annualized_return: annualized_return(benchmark_closes, bars_per_year),
            benchmark_max_drawdown: benchmark_dd.value,
            benchmark_max_drawdown_start: benchmark_dd.start_index.and_then(|i| timestamps.get(i).copied()),
            benchmark_max_drawdown_end: benchmark_dd.end_index.and_then(|i| timestamps.get(i).copied()),
        }
    }
}

fn simple_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn population_stddev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    variance.sqrt()
}

/// Median gap between consecutive timestamps maps to a standard trading
/// calendar: sub-hourly -> minute bars (252 days x 240 bars), daily ->
/// 252, weekly -> 52, monthly -> 12.
fn infer_bars_per_year(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.len() < 2 {
        return 252.0;
    }
    let mut deltas: Vec<i64> = timestamps.windows(2).map(|w| (w[1] - w[0]).num_seconds()).collect();
    deltas.sort_unstable();
    let median_secs = deltas[deltas.len() / 2] as f64;
    if median_secs <= 0.0 {
        252.0
    } else if median_secs < 3_600.0 {
        252.0 * 240.0
    } else if median_secs < 3_600.0 * 20.0 {
        252.0
    } else if median_secs < 3_600.0 * 24.0 * 10.0 {
        52.0
    } else {
        12.0
    }
}

fn total_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

fn annualized_return(values: &[f64], bars_per_year: f64) -> f64 {
    let bars = values.len() as f64;
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if first != 0.0 && bars > 0.0 => {
            (last / first).powf(bars_per_year / bars) - 1.0
        }
        _ => 0.0,
    }
}

/// Largest peak-to-trough fractional decline. `start`/`end` bracket the
/// drawdown episode: `start` is the peak's index, `end` is the first
/// subsequent index that recovers to the peak value, or the series' last
/// index if it never recovers.
fn max_drawdown(values: &[f64]) -> Drawdown {
    if values.is_empty() {
        return Drawdown {
            value: 0.0,
            start_index: None,
            end_index: None,
            duration: 0,
        };
    }

    let mut peak = values[0];
    let mut peak_index = 0;
    let mut worst = 0.0;
    let mut worst_peak_index = 0;
    let mut worst_trough_index = 0;

    for (i, &v) in values.iter().enumerate() {
        if v > peak {
            peak = v;
            peak_index = i;
        }
        let drawdown = if peak > 0.0 { 1.0 - v / peak } else { 0.0 };
        if drawdown > worst {
            worst = drawdown;
            worst_peak_index = peak_index;
            worst_trough_index = i;
        }
    }

    let peak_value = values[worst_peak_index];
    let mut end_index = values.len() - 1;
    for (j, &v) in values.iter().enumerate().skip(worst_trough_index + 1) {
        if v >= peak_value {
            end_index = j;
            break;
        }
    }

    Drawdown {
        value: worst,
        start_index: Some(worst_peak_index),
        end_index: Some(end_index),
        duration: end_index.saturating_sub(worst_peak_index),
    }
}

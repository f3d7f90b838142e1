//! The scheduler: owns the engine's mutable state across a run and drives
//! the bar-by-bar loop — load data, run `on_start`, precompute indicators,
//! then for every benchmark bar: release T+1 holds, snapshot a `Context`,
//! call the strategy, settle pending intents, mark to market, advance.

use super::accounting::{mark_to_market, record_equity, EquityPoint};
use super::context::{Context, PositionView, RejectionRecord};
use super::matcher;
use super::start_context::StartContext;
use super::state_bag::StateBag;
use super::trade_extraction::extract_trades;
use crate::config::Config;
use crate::data::{BarStore, Timeline};
use crate::domain::{Account, Bar, BarError, Fill, TradeRecord};
use crate::error::{EngineError, Result};
use crate::indicators::{IndicatorEngine, IndicatorRegistry};
use crate::orders::PendingOrderBook;
use crate::stats::Stats;
use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// The complete output of a backtest run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunResult {
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<Fill>,
    pub trades: Vec<TradeRecord>,
    pub rejections: Vec<RejectionRecordOwned>,
    pub stats: Stats,
}

/// Owned, serializable form of a rejection, for the run result.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RejectionRecordOwned {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub reason: String,
}

impl From<RejectionRecord> for RejectionRecordOwned {
    fn from(r: RejectionRecord) -> Self {
        Self {
            timestamp: r.timestamp,
            symbol: r.symbol,
            reason: r.reason,
        }
    }
}

/// Owns every piece of mutable state for one backtest: loaded bars, the
/// benchmark clock, the indicator registry/engine, and configuration. A
/// fresh `Engine` is built per run; it is not reused across runs.
pub struct Engine {
    bar_store: BarStore,
    timeline: Timeline,
    benchmark_closes: Vec<f64>,
    registry: IndicatorRegistry,
    indicator_engine: IndicatorEngine,
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            bar_store: BarStore::new(),
            timeline: Timeline::new(Vec::new()),
            benchmark_closes: Vec::new(),
            registry: IndicatorRegistry::new(),
            indicator_engine: IndicatorEngine::default(),
            config,
        }
    }

    /// Loads one symbol's OHLCV history. Bars are validated for sanity and
    /// strictly increasing timestamps; any violation is a fatal data error
    /// raised before the run starts.
    pub fn add_market_data(&mut self, symbol: &str, bars: Vec<Bar>) -> Result<()> {
        self.bar_store
            .add_market_data(symbol, bars)
            .map_err(bar_error_to_engine_error)
    }

    /// Sets the benchmark bar series: its timestamps drive the clock, and
    /// its close prices are the basis for the `benchmark_*` statistics.
    pub fn set_benchmark(&mut self, bars: Vec<Bar>) -> Result<()> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(bar_error_to_engine_error(BarError::InsaneOhlc {
                    symbol: "__benchmark__".to_string(),
                    index,
                }));
            }
        }
        let timestamps = bars.iter().map(|b| b.timestamp).collect();
        self.benchmark_closes = bars.iter().map(|b| b.close).collect();
        self.timeline = Timeline::new(timestamps);
        Ok(())
    }

    /// Runs the strategy over the full benchmark timeline and returns the
    /// equity curve, fill log, extracted trades, rejections, and stats.
    ///
    /// A strategy panic aborts the run: it is caught, logged with the bar
    /// index and timestamp at which it occurred, and surfaced to the
    /// caller as `EngineError::Strategy`.
    pub fn run(&mut self, strategy: &mut dyn Strategy) -> Result<RunResult> {
        let start_timestamp = self.timeline.current_timestamp().ok_or_else(|| {
            EngineError::Config("benchmark timeline is empty; call set_benchmark before run".to_string())
        })?;

        self.bar_store.apply_window(self.config.start, self.config.end);

        let mut account = Account::new(self.config.cash);
        let mut state = StateBag::new();
        let mut book = PendingOrderBook::new();
        let mut rejections: Vec<RejectionRecord> = Vec::new();
        let mut fills_log: Vec<Fill> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::new();

        {
            let mut start_ctx = StartContext::new(&mut state, &mut self.registry);
            guard_strategy_call(0, start_timestamp, "on_start", || {
                strategy.on_start(&mut start_ctx)
            })?;
        }

        self.indicator_engine = IndicatorEngine::precompute(&self.registry, &self.bar_store);

        let mut symbols: Vec<String> = self.bar_store.symbols().map(String::from).collect();
        symbols.sort();

        self.timeline.reset();
        let mut last_timestamp = start_timestamp;

        while self.timeline.has_next() {
            let current_ts = self.timeline.current_timestamp().expect("has_next guarantees a timestamp");
            last_timestamp = current_ts;
            account.release_t1_all();

            let bars_this_bar = current_bars(&self.bar_store, &symbols, current_ts);
            let marks = mark_to_market(&account, &self.bar_store, current_ts);
            let equity = account.equity(&marks);
            let positions = position_views(&account, &marks, equity);

            {
                let mut ctx = Context::new(
                    current_ts,
                    symbols.clone(),
                    account.cash,
                    equity,
                    positions.clone(),
                    bars_this_bar.clone(),
                    &mut state,
                    &self.bar_store,
                    &self.indicator_engine,
                    self.timeline.current_index(),
                    &mut book,
                    &mut rejections,
                );
                let index = self.timeline.current_index();
                guard_strategy_call(index, current_ts, "on_bar", || strategy.on_bar(&mut ctx))?;
            }

            let intents = book.take_all();
            let (fills, settlement_rejections) = matcher::settle(
                intents,
                &mut account,
                &self.bar_store,
                &self.timeline,
                &marks,
                &self.config,
            );
            for rejection in settlement_rejections {
                rejections.push(RejectionRecord {
                    timestamp: current_ts,
                    symbol: rejection.symbol,
                    reason: rejection.reason.to_string(),
                });
            }

            for fill in &fills {
                let mut ctx = Context::new(
                    current_ts,
                    symbols.clone(),
                    account.cash,
                    equity,
                    positions.clone(),
                    bars_this_bar.clone(),
                    &mut state,
                    &self.bar_store,
                    &self.indicator_engine,
                    self.timeline.current_index(),
                    &mut book,
                    &mut rejections,
                );
                let index = self.timeline.current_index();
                guard_strategy_call(index, current_ts, "on_trade", || {
                    strategy.on_trade(fill, &mut ctx)
                })?;
            }
            fills_log.extend(fills);

            record_equity(&mut equity_curve, &account, &marks, current_ts);
            self.timeline.advance();
        }

        {
            let marks = mark_to_market(&account, &self.bar_store, last_timestamp);
            let equity = account.equity(&marks);
            let positions = position_views(&account, &marks, equity);
            let bars_this_bar = current_bars(&self.bar_store, &symbols, last_timestamp);
            let mut ctx = Context::new(
                last_timestamp,
                symbols.clone(),
                account.cash,
                equity,
                positions,
                bars_this_bar,
                &mut state,
                &self.bar_store,
                &self.indicator_engine,
                self.timeline.current_index().saturating_sub(1),
                &mut book,
                &mut rejections,
            );
            let final_index = self.timeline.len().saturating_sub(1);
            guard_strategy_call(final_index, last_timestamp, "on_stop", || {
                strategy.on_stop(&mut ctx)
            })?;
        }

        let bar_index_of: HashMap<DateTime<Utc>, usize> = self
            .timeline
            .timestamps()
            .iter()
            .enumerate()
            .map(|(i, ts)| (*ts, i))
            .collect();
        let trades = extract_trades(&fills_log, &bar_index_of);

        let stats = Stats::compute(
            &equity_curve,
            &trades,
            &fills_log,
            &self.benchmark_closes,
            self.config.period,
        );

        Ok(RunResult {
            equity_curve,
            fills: fills_log,
            trades,
            rejections: rejections.into_iter().map(RejectionRecordOwned::from).collect(),
            stats,
        })
    }
}

fn current_bars(bar_store: &BarStore, symbols: &[String], timestamp: DateTime<Utc>) -> HashMap<String, Bar> {
    symbols
        .iter()
        .filter_map(|symbol| bar_store.get_bar_at(symbol, timestamp).map(|bar| (symbol.clone(), bar.clone())))
        .collect()
}

fn position_views(account: &Account, marks: &HashMap<String, f64>, equity: f64) -> HashMap<String, PositionView> {
    account
        .positions
        .iter()
        .map(|(symbol, pos)| {
            let price = marks.get(symbol).copied().unwrap_or(pos.avg_cost);
            let value = pos.market_value(price);
            let weight = if equity.abs() > 1e-9 { value / equity } else { 0.0 };
            (
                symbol.clone(),
                PositionView {
                    qty: pos.qty,
                    available: pos.available_qty,
                    weight,
                    avg_cost: pos.avg_cost,
                },
            )
        })
        .collect()
}

fn bar_error_to_engine_error(err: BarError) -> EngineError {
    match err {
        BarError::UnparseableTimestamp { symbol, index, raw } => EngineError::Data {
            symbol,
            index,
            reason: format!("unparseable timestamp {raw:?}"),
        },
        BarError::InsaneOhlc { symbol, index } => EngineError::Data {
            symbol,
            index,
            reason: "OHLC sanity check failed".to_string(),
        },
        BarError::NonMonotonic { symbol, index } => EngineError::Data {
            symbol,
            index,
            reason: "timestamps not strictly increasing".to_string(),
        },
    }
}

/// Runs a strategy callback, catching any panic and surfacing it as a fatal
/// `EngineError::Strategy` tagged with the bar at which it occurred.
fn guard_strategy_call(
    bar_index: usize,
    timestamp: DateTime<Utc>,
    label: &str,
    f: impl FnOnce(),
) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => Ok(()),
        Err(payload) => {
            let reason = panic_message(&payload);
            tracing::error!(bar_index, %timestamp, callback = label, reason = %reason, "strategy panicked; aborting run");
            Err(EngineError::Strategy {
                bar_index,
                timestamp,
                reason,
            })
        }
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "strategy panicked with a non-string payload".to_string()
    }
}

//! Criterion benchmarks for the backtester's hot paths.
//!
//! Benchmarks:
//! 1. Full bar loop (`Engine::run`, a no-op strategy, increasing bar counts)
//! 2. Indicator precompute (SMA + RSI, batch across symbols)
//! 3. Order book submit/drain
//! 4. Matcher settlement (weight-typed rebalance intents)

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

use tradebench_core::config::BacktestConfig;
use tradebench_core::data::{BarStore, Timeline};
use tradebench_core::domain::{Account, Bar, OrderIntent};
use tradebench_core::engine::matcher;
use tradebench_core::engine::Context;
use tradebench_core::indicators::{Field, IndicatorEngine, IndicatorRegistry, Rsi, Sma};
use tradebench_core::orders::PendingOrderBook;
use tradebench_core::{Engine, Strategy};

fn make_bars(symbol: &str, n: usize) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            let high = close + 1.5;
            let low = close - 1.5;
            Bar {
                symbol: symbol.to_string(),
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000_000.0 + (i as f64 % 500_000.0),
            }
        })
        .collect()
}

struct NullStrategy;
impl Strategy for NullStrategy {
    fn on_bar(&mut self, _ctx: &mut Context) {}
}

struct RebalanceEveryTenBars {
    symbols: Vec<String>,
    bar_index: usize,
}
impl Strategy for RebalanceEveryTenBars {
    fn on_bar(&mut self, ctx: &mut Context) {
        if self.bar_index % 10 == 0 {
            let weight = 1.0 / self.symbols.len() as f64;
            let weights: HashMap<String, f64> = self.symbols.iter().map(|s| (s.clone(), weight)).collect();
            ctx.order.target(&weights);
        }
        self.bar_index += 1;
    }
}

fn make_single_symbol_engine(bar_count: usize) -> Engine {
    let config = BacktestConfig {
        cash: Some(1_000_000.0),
        lot_size: Some(1),
        ..Default::default()
    }
    .build()
    .unwrap();
    let mut engine = Engine::new(config);
    let bars = make_bars("BENCH", bar_count);
    engine.add_market_data("BENCH", bars.clone()).unwrap();
    engine.set_benchmark(bars).unwrap();
    engine
}

fn make_multi_symbol_engine(bar_count: usize, num_symbols: usize) -> (Engine, Vec<String>) {
    let config = BacktestConfig {
        cash: Some(1_000_000.0),
        lot_size: Some(1),
        ..Default::default()
    }
    .build()
    .unwrap();
    let mut engine = Engine::new(config);
    let mut symbols = Vec::with_capacity(num_symbols);
    for i in 0..num_symbols {
        let symbol = format!("SYM{i}");
        let bars = make_bars(&symbol, bar_count);
        engine.add_market_data(&symbol, bars).unwrap();
        symbols.push(symbol);
    }
    let benchmark = make_bars("BENCH", bar_count);
    engine.set_benchmark(benchmark).unwrap();
    (engine, symbols)
}

// ── 1. Full bar loop ──────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_event_loop");

    for &bar_count in &[252, 1260, 2520] {
        group.bench_with_input(BenchmarkId::new("null_strategy", bar_count), &bar_count, |b, &n| {
            b.iter(|| {
                let mut engine = make_single_symbol_engine(n);
                let mut strategy = NullStrategy;
                black_box(engine.run(&mut strategy).unwrap());
            });
        });
    }

    let (mut engine, symbols) = make_multi_symbol_engine(1260, 10);
    group.bench_function("10_symbols_1260_bars_rebalance", |b| {
        b.iter(|| {
            let mut strategy = RebalanceEveryTenBars {
                symbols: symbols.clone(),
                bar_index: 0,
            };
            black_box(engine.run(&mut strategy).unwrap());
        });
    });

    group.finish();
}

// ── 2. Indicator precompute ───────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");

    for &bar_count in &[252, 1260, 2520] {
        let mut store = BarStore::new();
        store.add_market_data("BENCH", make_bars("BENCH", bar_count)).unwrap();
        let mut registry = IndicatorRegistry::new();
        registry.register("sma20", Box::new(Sma::new(20, Field::Close)));
        registry.register("sma50", Box::new(Sma::new(50, Field::Close)));
        registry.register("rsi14", Box::new(Rsi::new(14, Field::Close)));

        group.bench_with_input(BenchmarkId::new("sma_sma_rsi", bar_count), &bar_count, |b, _| {
            b.iter(|| black_box(IndicatorEngine::precompute(&registry, &store)));
        });
    }

    group.finish();
}

// ── 3. Order book submit/drain ────────────────────────────────────────

fn bench_order_book(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_book");

    let mut store = BarStore::new();
    store.add_market_data("BENCH", make_bars("BENCH", 10)).unwrap();

    group.bench_function("submit_drain_100", |b| {
        b.iter(|| {
            let mut book = PendingOrderBook::new();
            for _ in 0..100 {
                let _ = book.add_order(
                    OrderIntent::count("BENCH", tradebench_core::domain::OrderSide::Buy, 10.0),
                    &store,
                );
            }
            black_box(book.take_all());
        });
    });

    group.finish();
}

// ── 4. Matcher settlement ─────────────────────────────────────────────

fn bench_matcher_settlement(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher_settlement");

    let config = BacktestConfig {
        cash: Some(10_000_000.0),
        lot_size: Some(1),
        ..Default::default()
    }
    .build()
    .unwrap();

    let mut store = BarStore::new();
    let mut symbols = Vec::new();
    for i in 0..50 {
        let symbol = format!("SYM{i}");
        store.add_market_data(&symbol, make_bars(&symbol, 10)).unwrap();
        symbols.push(symbol);
    }
    let timestamps: Vec<_> = (0..10)
        .map(|i| Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap() + chrono::Duration::days(i))
        .collect();

    group.bench_function("rebalance_50_symbols", |b| {
        b.iter(|| {
            let mut account = Account::new(config.cash);
            let timeline = Timeline::new(timestamps.clone());
            let mut marks = HashMap::new();
            for symbol in &symbols {
                marks.insert(symbol.clone(), 100.0);
            }
            let intents: Vec<_> = symbols.iter().map(|s| OrderIntent::weight(s.clone(), 1.0 / 50.0)).collect();
            black_box(matcher::settle(intents, &mut account, &store, &timeline, &marks, &config));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_bar_loop, bench_indicators, bench_order_book, bench_matcher_settlement);
criterion_main!(benches);

//! Criterion benchmarks for Foodcast hot paths.
//!
//! Benchmarks:
//! 1. CSV load and cleaning
//! 2. Single-series model fit at several history lengths
//! 3. Forecast with the default 1000 uncertainty samples

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use foodcast_core::data::{generate_table, write_csv, DataSourceConfig, DataStore, Table};
use foodcast_core::domain::Item;
use foodcast_core::forecast::Forecaster;
use foodcast_core::model::ModelTrainer;

// ── Helpers ──────────────────────────────────────────────────────────

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn make_table(step_days: i64) -> Table {
    generate_table(&["Lagos", "Kano", "Oyo"], ymd(2019, 1, 1), ymd(2023, 12, 31), step_days)
}

// ── 1. Load ──────────────────────────────────────────────────────────

fn bench_load(c: &mut Criterion) {
    let config = DataSourceConfig::default();
    let mut csv = Vec::new();
    write_csv(&make_table(7), &config, &mut csv).unwrap();
    let store = DataStore::new(config);

    c.bench_function("load_csv_3_regions_weekly", |b| {
        b.iter(|| store.load_from_reader(black_box(csv.as_slice()), "bench").unwrap())
    });
}

// ── 2. Fit ───────────────────────────────────────────────────────────

fn bench_fit(c: &mut Criterion) {
    let trainer = ModelTrainer::default();
    let mut group = c.benchmark_group("fit_single_series");
    for step in [30_i64, 7, 1] {
        let table = make_table(step);
        let n = table.observations(&foodcast_core::SeriesKey::new("Lagos", Item::Rice)).len();
        group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, table| {
            b.iter(|| trainer.train("Lagos", Item::Rice, black_box(table)).unwrap())
        });
    }
    group.finish();
}

// ── 3. Predict ───────────────────────────────────────────────────────

fn bench_predict(c: &mut Criterion) {
    let table = make_table(7);
    let model = ModelTrainer::default()
        .train("Lagos", Item::Rice, &table)
        .unwrap();
    let forecaster = Forecaster::default();
    let target = ymd(2024, 6, 1);

    c.bench_function("predict_1000_samples", |b| {
        b.iter(|| {
            forecaster
                .predict(black_box(&model), target, 130.0)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_load, bench_fit, bench_predict);
criterion_main!(benches);

//! End-to-end: CSV on disk → table → fitted model → forecast.

use chrono::{Duration, NaiveDate};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use foodcast_core::data::{generate_table, write_csv, DataSourceConfig, DataStore};
use foodcast_core::domain::{Item, SeriesKey};
use foodcast_core::forecast::Forecaster;
use foodcast_core::model::{FitError, ModelTrainer};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_csv(contents: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "foodcast_pipeline_{}_{id}.csv",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const HEADER: &str = "price_date,state,c_bread,c_cassava_meal,c_cowpeas,c_gari,c_groundnuts,c_millet,c_sorghum,c_yam,c_rice,c_maize,inflation_food_price_index";

/// Three years of daily Lagos rows. Only rice is priced; the inflation
/// index is constant at 110.
fn lagos_rice_csv() -> (String, Vec<f64>) {
    let start = ymd(2021, 1, 1);
    let mut csv = String::from(HEADER);
    csv.push('\n');
    let mut prices = Vec::new();
    for day in 0..(3 * 365) {
        let date = start + Duration::days(day);
        let price = 40_000.0
            + 12.0 * day as f64
            + 1_500.0 * (2.0 * std::f64::consts::PI * day as f64 / 365.25).sin()
            + if day % 2 == 0 { 150.0 } else { -150.0 };
        prices.push(price);
        writeln!(csv, "{date},Lagos,,,,,,,,,{price:.2},,110").unwrap();
    }
    (csv, prices)
}

#[test]
fn lagos_rice_forecast_tracks_recent_prices() {
    let (csv, prices) = lagos_rice_csv();
    let path = temp_csv(&csv);
    let store = DataStore::new(DataSourceConfig {
        path: path.clone(),
        ..Default::default()
    });
    let table = store.load().unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(table.regions(), vec!["Lagos".to_string()]);
    assert_eq!(table.last_regressor_value("Lagos"), Some(110.0));

    let model = ModelTrainer::default()
        .train("Lagos", Item::Rice, &table)
        .unwrap();
    assert_eq!(model.meta().n_observations, prices.len());

    let last_date = table.last_date("Lagos").unwrap();
    let target = last_date + Duration::days(30);
    let result = Forecaster::default()
        .predict(&model, target, 110.0)
        .unwrap();

    let recent: f64 = prices[prices.len() - 30..].iter().sum::<f64>() / 30.0;
    assert!(
        (result.point_estimate - recent).abs() < 0.2 * recent,
        "point {} too far from recent average {recent}",
        result.point_estimate
    );
    assert!(result.is_ordered(), "{result:?}");
    assert!(result.interval_width() > 0.0);
}

#[test]
fn other_items_for_the_same_region_are_insufficient() {
    let (csv, _) = lagos_rice_csv();
    let table = DataStore::new(DataSourceConfig::default())
        .load_from_reader(csv.as_bytes(), "inline")
        .unwrap();

    let err = ModelTrainer::default()
        .train("Lagos", Item::Maize, &table)
        .unwrap_err();
    match err {
        FitError::InsufficientData { key, actual, .. } => {
            assert_eq!(key, SeriesKey::new("Lagos", Item::Maize));
            assert_eq!(actual, 0);
        }
        other => panic!("expected InsufficientData, got {other:?}"),
    }
}

#[test]
fn missing_regressor_cells_are_filled_with_the_global_mean() {
    let csv = format!(
        "{HEADER}\n\
         2024-01-01,Kano,,,,,,,,,900,,100\n\
         2024-02-01,Kano,,,,,,,,,910,,\n\
         2024-03-01,Kano,,,,,,,,,920,,n/a\n\
         2024-01-01,Oyo,,,,,,,,,800,,120\n"
    );
    let table = DataStore::new(DataSourceConfig::default())
        .load_from_reader(csv.as_bytes(), "inline")
        .unwrap();

    assert_eq!(table.report().imputed_regressors, 2);
    assert_eq!(table.report().regressor_fill_value, Some(110.0));
    assert_eq!(table.last_regressor_value("Kano"), Some(110.0));
    assert_eq!(table.last_regressor_value("Oyo"), Some(120.0));
}

#[test]
fn synthetic_dataset_trains_every_series() {
    let table = generate_table(&["Abuja"], ymd(2020, 1, 1), ymd(2023, 12, 31), 14);
    let mut buf = Vec::new();
    write_csv(&table, &DataSourceConfig::default(), &mut buf).unwrap();
    let reloaded = DataStore::new(DataSourceConfig::default())
        .load_from_reader(buf.as_slice(), "synthetic")
        .unwrap();

    let trainer = ModelTrainer::default();
    let forecaster = Forecaster::default();
    for key in reloaded.series_keys() {
        let model = trainer.train(&key.region, key.item, &reloaded).unwrap();
        let result = forecaster
            .predict(&model, ymd(2024, 3, 1), reloaded.last_regressor_value("Abuja").unwrap())
            .unwrap();
        assert!(result.is_ordered(), "{key}: {result:?}");
        assert!(result.point_estimate > 0.0, "{key}: {result:?}");
    }
}

//! Synthetic price datasets for development and tests.
//!
//! Each region gets a deterministic RNG seeded from its name, so the same
//! arguments always produce the same table. Prices follow a gentle upward
//! trend with a yearly cycle and small multiplicative noise; the inflation
//! index drifts upward from 100.

use super::store::DataSourceConfig;
use super::table::{PriceRecord, Table};
use crate::domain::Item;
use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

/// Typical price level per item, in Naira.
fn base_price(item: Item) -> f64 {
    match item {
        Item::Bread => 450.0,
        Item::CassavaMeal => 28_000.0,
        Item::Cowpeas => 45_000.0,
        Item::Gari => 30_000.0,
        Item::Groundnuts => 52_000.0,
        Item::Millet => 33_000.0,
        Item::Sorghum => 31_000.0,
        Item::Yam => 400.0,
        Item::Rice => 38_000.0,
        Item::Maize => 29_000.0,
    }
}

/// Generate rows for every region from `start` to `end` (inclusive), one row
/// per region every `step_days` days.
pub fn generate_table(regions: &[&str], start: NaiveDate, end: NaiveDate, step_days: i64) -> Table {
    let step = Duration::days(step_days.max(1));
    let mut records = Vec::new();

    for region in regions {
        let seed_bytes = blake3::hash(region.as_bytes());
        let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

        let region_level: f64 = rng.gen_range(0.85..1.15);
        let mut inflation = 100.0_f64;
        let mut current = start;

        while current <= end {
            let years = (current - start).num_days() as f64 / 365.25;
            let phase = 2.0 * std::f64::consts::PI * current.ordinal() as f64 / 365.25;

            let mut prices = [None; 10];
            for item in Item::ALL {
                let trend = 1.0 + 0.08 * years;
                let season = 1.0 + 0.05 * (phase + item.index() as f64).sin();
                let noise = 1.0 + rng.gen_range(-0.01..0.01);
                prices[item.index()] =
                    Some(base_price(item) * region_level * trend * season * noise);
            }

            records.push(PriceRecord {
                date: current,
                region: region.to_string(),
                prices,
                regressor_value: inflation,
            });

            inflation *= 1.0 + rng.gen_range(0.0..0.002) * step_days as f64 / 30.0;
            current += step;
        }
    }

    Table::from_records(records)
}

/// Write a table as CSV using the column names of `config`.
pub fn write_csv<W: Write>(table: &Table, config: &DataSourceConfig, writer: W) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec![config.date_column.as_str(), config.region_column.as_str()];
    header.extend(Item::ALL.iter().map(|i| i.column_name()));
    header.push(config.regressor_column.as_str());
    out.write_record(&header)?;

    for record in table.records() {
        let mut row = vec![record.date.format("%Y-%m-%d").to_string(), record.region.clone()];
        row.extend(
            record
                .prices
                .iter()
                .map(|p| p.map(|v| format!("{v:.2}")).unwrap_or_default()),
        );
        row.push(format!("{:.4}", record.regressor_value));
        out.write_record(&row)?;
    }

    out.flush()?;
    Ok(())
}

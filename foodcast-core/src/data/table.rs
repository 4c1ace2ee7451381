//! The cleaned, time-indexed price table.
//!
//! A [`Table`] is built once (by the data store or the synthetic generator) and
//! is read-only afterwards. Rows are sorted by date ascending; rows sharing a
//! date keep their source order.

use super::store::LoadReport;
use crate::domain::{DatasetHash, Item, Observation, Region, SeriesKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One wide row of the dataset: all ten item prices for a region on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub region: String,
    /// Indexed by [`Item::index`]. `None` when the cell was empty or not numeric.
    pub prices: [Option<f64>; 10],
    pub regressor_value: f64,
}

impl PriceRecord {
    pub fn price(&self, item: Item) -> Option<f64> {
        self.prices[item.index()]
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    records: Vec<PriceRecord>,
    dataset_hash: DatasetHash,
    report: LoadReport,
}

impl Table {
    /// Build a table from already-clean records. Sorts by date and hashes.
    pub fn from_records(records: Vec<PriceRecord>) -> Self {
        Self::with_report(records, LoadReport::default())
    }

    pub(crate) fn with_report(mut records: Vec<PriceRecord>, report: LoadReport) -> Self {
        records.sort_by_key(|r| r.date);
        let dataset_hash = compute_dataset_hash(&records);
        Self {
            records,
            dataset_hash,
            report,
        }
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dataset_hash(&self) -> &DatasetHash {
        &self.dataset_hash
    }

    /// Cleaning report from load time (parse issues, imputed cells).
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Unique regions, sorted.
    pub fn regions(&self) -> Vec<Region> {
        self.records
            .iter()
            .map(|r| r.region.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.records.iter().any(|r| r.region == region)
    }

    /// Every (region, item) pair: the full training cross product.
    pub fn series_keys(&self) -> Vec<SeriesKey> {
        self.regions()
            .into_iter()
            .flat_map(|region| {
                Item::ALL
                    .into_iter()
                    .map(move |item| SeriesKey::new(region.clone(), item))
            })
            .collect()
    }

    /// Observations for one series, in date order. Rows without a price for
    /// the item are skipped.
    pub fn observations(&self, key: &SeriesKey) -> Vec<Observation> {
        self.records
            .iter()
            .filter(|r| r.region == key.region)
            .filter_map(|r| {
                r.price(key.item).map(|price| Observation {
                    date: r.date,
                    region: r.region.clone(),
                    item: key.item,
                    price,
                    regressor_value: r.regressor_value,
                })
            })
            .collect()
    }

    /// Regressor value on the region's most recent row.
    pub fn last_regressor_value(&self, region: &str) -> Option<f64> {
        self.records
            .iter()
            .rev()
            .find(|r| r.region == region)
            .map(|r| r.regressor_value)
    }

    /// Most recent date observed for the region.
    pub fn last_date(&self, region: &str) -> Option<NaiveDate> {
        self.records
            .iter()
            .rev()
            .find(|r| r.region == region)
            .map(|r| r.date)
    }
}

/// Deterministic BLAKE3 hash over every cleaned row, in table order.
fn compute_dataset_hash(records: &[PriceRecord]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();

    for record in records {
        hasher.update(record.date.to_string().as_bytes());
        hasher.update(record.region.as_bytes());
        for price in &record.prices {
            match price {
                Some(p) => {
                    hasher.update(&[1]);
                    hasher.update(&p.to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
        hasher.update(&record.regressor_value.to_le_bytes());
    }

    DatasetHash(hasher.finalize().to_hex().to_string())
}

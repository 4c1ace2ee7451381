//! CSV data store: reads the price dataset and cleans it into a [`Table`].
//!
//! Cleaning policy:
//! 1. Parse the date column (several common layouts accepted)
//! 2. Coerce the regressor and item price columns to numbers; bad cells
//!    become null and are recorded as [`ParseIssue`]s, never errors
//! 3. Drop rows with a blank region cell, recording their line numbers
//! 4. Fill null regressor cells with the mean over the kept rows
//! 5. Sort rows by date ascending
//!
//! A missing file, unreadable CSV, missing required column or bad date is
//! fatal and reported as [`DataError::DataUnavailable`].

use super::table::{PriceRecord, Table};
use crate::domain::Item;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data loading.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data unavailable: {source_name}: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    #[error("data unavailable: {source_name}: missing required column '{column}'")]
    MissingColumn { source_name: String, column: String },

    #[error("data unavailable: {source_name}: line {line}: unparseable date '{value}'")]
    InvalidDate {
        source_name: String,
        line: u64,
        value: String,
    },

    #[error(
        "data unavailable: {source_name}: regressor column '{column}' has no numeric values to impute from"
    )]
    NoRegressorValues { source_name: String, column: String },
}

/// Where the dataset lives and what its columns are called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub path: PathBuf,
    pub date_column: String,
    pub region_column: String,
    pub regressor_column: String,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("FPAM.csv"),
            date_column: "price_date".into(),
            region_column: "state".into(),
            regressor_column: "inflation_food_price_index".into(),
        }
    }
}

/// A numeric cell that could not be parsed and was treated as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub line: u64,
    pub column: String,
    pub raw: String,
}

/// What the cleaning pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows: usize,
    pub parse_issues: Vec<ParseIssue>,
    /// Lines dropped because the region cell was blank.
    pub blank_region_lines: Vec<u64>,
    pub imputed_regressors: usize,
    /// Mean used to fill null regressor cells, if any were filled.
    pub regressor_fill_value: Option<f64>,
    pub missing_item_columns: Vec<Item>,
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Loads and cleans the historical dataset.
#[derive(Debug, Clone)]
pub struct DataStore {
    config: DataSourceConfig,
}

impl DataStore {
    pub fn new(config: DataSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    /// Read and clean the configured CSV file.
    pub fn load(&self) -> Result<Table, DataError> {
        let source_name = self.config.path.display().to_string();
        let file = File::open(&self.config.path).map_err(|e| DataError::DataUnavailable {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        self.load_from_reader(file, &source_name)
    }

    /// Read and clean CSV from any reader. `source_name` is used in errors.
    pub fn load_from_reader<R: Read>(
        &self,
        reader: R,
        source_name: &str,
    ) -> Result<Table, DataError> {
        let unavailable = |reason: String| DataError::DataUnavailable {
            source_name: source_name.to_string(),
            reason,
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| unavailable(e.to_string()))?
            .clone();

        let find_column = |name: &str| -> Result<usize, DataError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::MissingColumn {
                    source_name: source_name.to_string(),
                    column: name.to_string(),
                })
        };
        let date_idx = find_column(&self.config.date_column)?;
        let region_idx = find_column(&self.config.region_column)?;
        let regressor_idx = find_column(&self.config.regressor_column)?;

        let mut report = LoadReport::default();
        let mut item_idx: [Option<usize>; 10] = [None; 10];
        for item in Item::ALL {
            item_idx[item.index()] = headers.iter().position(|h| h == item.column_name());
            if item_idx[item.index()].is_none() {
                tracing::warn!(
                    column = item.column_name(),
                    source = source_name,
                    "item column missing; prices treated as absent"
                );
                report.missing_item_columns.push(item);
            }
        }

        // Regressor cells stay optional until the dataset-wide mean is known.
        let mut rows: Vec<(PriceRecord, Option<f64>)> = Vec::new();

        for result in csv_reader.records() {
            let record = result.map_err(|e| unavailable(e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let raw_date = record.get(date_idx).unwrap_or("");
            let date = parse_date(raw_date).ok_or_else(|| DataError::InvalidDate {
                source_name: source_name.to_string(),
                line,
                value: raw_date.to_string(),
            })?;
            let region = record.get(region_idx).unwrap_or("");
            if region.trim().is_empty() {
                report.blank_region_lines.push(line);
                continue;
            }
            let region = region.to_string();

            let mut coerce = |idx: usize, column: &str| -> Option<f64> {
                let raw = record.get(idx).unwrap_or("");
                match coerce_numeric(raw) {
                    Ok(v) => v,
                    Err(()) => {
                        report.parse_issues.push(ParseIssue {
                            line,
                            column: column.to_string(),
                            raw: raw.to_string(),
                        });
                        None
                    }
                }
            };

            let regressor = coerce(regressor_idx, &self.config.regressor_column);
            let mut prices = [None; 10];
            for item in Item::ALL {
                if let Some(idx) = item_idx[item.index()] {
                    prices[item.index()] = coerce(idx, item.column_name());
                }
            }

            rows.push((
                PriceRecord {
                    date,
                    region,
                    prices,
                    regressor_value: f64::NAN,
                },
                regressor,
            ));
        }

        let present: Vec<f64> = rows.iter().filter_map(|(_, r)| *r).collect();
        let missing = rows.len() - present.len();
        let fill_value = if missing == 0 {
            None
        } else if present.is_empty() {
            return Err(DataError::NoRegressorValues {
                source_name: source_name.to_string(),
                column: self.config.regressor_column.clone(),
            });
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        };

        let records: Vec<PriceRecord> = rows
            .into_iter()
            .map(|(mut record, regressor)| {
                // fill_value is Some whenever any regressor is None
                record.regressor_value = regressor.or(fill_value).unwrap_or(f64::NAN);
                record
            })
            .collect();

        report.rows = records.len();
        report.imputed_regressors = missing;
        report.regressor_fill_value = fill_value;

        if !report.parse_issues.is_empty() {
            tracing::warn!(
                source = source_name,
                issues = report.parse_issues.len(),
                "non-numeric cells coerced to null"
            );
        }
        if !report.blank_region_lines.is_empty() {
            tracing::warn!(
                source = source_name,
                dropped = report.blank_region_lines.len(),
                "rows with a blank region dropped"
            );
        }
        if let Some(fill) = fill_value {
            tracing::info!(
                source = source_name,
                imputed = missing,
                fill,
                "imputed missing regressor values with dataset mean"
            );
        }

        let table = Table::with_report(records, report);
        tracing::info!(
            source = source_name,
            rows = table.len(),
            regions = table.regions().len(),
            dataset_hash = table.dataset_hash().short(),
            "dataset loaded"
        );
        Ok(table)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// `Ok(None)` for an empty cell, `Err` for a cell that is present but not a
/// finite number.
fn coerce_numeric(raw: &str) -> Result<Option<f64>, ()> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "price_date,state,c_bread,c_cassava_meal,c_cowpeas,c_gari,c_groundnuts,c_millet,c_sorghum,c_yam,c_rice,c_maize,inflation_food_price_index";

    fn load(csv: &str) -> Result<Table, DataError> {
        DataStore::new(DataSourceConfig::default()).load_from_reader(csv.as_bytes(), "test.csv")
    }

    #[test]
    fn loads_and_sorts_rows() {
        let csv = format!(
            "{HEADER}\n\
             2024-03-01,Lagos,1,2,3,4,5,6,7,8,9,10,112.0\n\
             2024-01-01,Lagos,1,2,3,4,5,6,7,8,9,10,110.0\n"
        );
        let table = load(&csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(table.records()[0].price(Item::Rice), Some(9.0));
        assert!(table.report().parse_issues.is_empty());
    }

    #[test]
    fn regressor_nulls_filled_with_global_mean() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01,Lagos,1,2,3,4,5,6,7,8,9,10,100.0\n\
             2024-02-01,Kano,1,2,3,4,5,6,7,8,9,10,\n\
             2024-03-01,Kano,1,2,3,4,5,6,7,8,9,10,n/a\n\
             2024-04-01,Kano,1,2,3,4,5,6,7,8,9,10,130.0\n"
        );
        let table = load(&csv).unwrap();

        assert!(table.records().iter().all(|r| r.regressor_value.is_finite()));
        // Mean over all regions, not Kano alone
        assert_eq!(table.records()[1].regressor_value, 115.0);
        assert_eq!(table.records()[2].regressor_value, 115.0);
        assert_eq!(table.report().imputed_regressors, 2);
        assert_eq!(table.report().regressor_fill_value, Some(115.0));

        let issues = &table.report().parse_issues;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].raw, "n/a");
        assert_eq!(issues[0].column, "inflation_food_price_index");
    }

    #[test]
    fn bad_price_cells_become_missing() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01,Lagos,1,2,3,4,5,6,7,8,abc,10,100.0\n"
        );
        let table = load(&csv).unwrap();
        assert_eq!(table.records()[0].price(Item::Rice), None);
        assert_eq!(table.records()[0].price(Item::Maize), Some(10.0));
        assert_eq!(table.report().parse_issues[0].column, "c_rice");
    }

    #[test]
    fn accepts_datetime_and_slash_dates() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-15 00:00:00,Lagos,1,2,3,4,5,6,7,8,9,10,100.0\n\
             02/15/2024,Lagos,1,2,3,4,5,6,7,8,9,10,100.0\n"
        );
        let table = load(&csv).unwrap();
        assert_eq!(table.records()[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(table.records()[1].date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let store = DataStore::new(DataSourceConfig {
            path: PathBuf::from("/nonexistent/foodcast/FPAM.csv"),
            ..Default::default()
        });
        let err = store.load().unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }

    #[test]
    fn missing_required_column_fails() {
        let err = load("price_date,state\n2024-01-01,Lagos\n").unwrap_err();
        match err {
            DataError::MissingColumn { column, .. } => {
                assert_eq!(column, "inflation_food_price_index")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_item_columns_are_tolerated() {
        let table = load(
            "price_date,state,c_rice,inflation_food_price_index\n2024-01-01,Lagos,500,100\n",
        )
        .unwrap();
        assert_eq!(table.records()[0].price(Item::Rice), Some(500.0));
        assert_eq!(table.records()[0].price(Item::Bread), None);
        assert_eq!(table.report().missing_item_columns.len(), 9);
    }

    #[test]
    fn unparseable_date_fails() {
        let csv = format!("{HEADER}\nnot-a-date,Lagos,1,2,3,4,5,6,7,8,9,10,100\n");
        assert!(matches!(load(&csv).unwrap_err(), DataError::InvalidDate { line: 2, .. }));
    }

    #[test]
    fn all_null_regressor_fails() {
        let csv = format!("{HEADER}\n2024-01-01,Lagos,1,2,3,4,5,6,7,8,9,10,\n");
        assert!(matches!(
            load(&csv).unwrap_err(),
            DataError::NoRegressorValues { .. }
        ));
    }

    #[test]
    fn ragged_rows_are_unavailable() {
        let csv = format!("{HEADER}\n2024-01-01,Lagos,1\n");
        assert!(matches!(
            load(&csv).unwrap_err(),
            DataError::DataUnavailable { .. }
        ));
    }

    #[test]
    fn blank_region_rows_are_dropped_and_reported() {
        let csv = format!(
            "{HEADER}\n\
             2024-01-01,Lagos,,,,,,,,,41000,,110\n\
             2024-01-01,,,,,,,,,,39000,,130\n\
             2024-02-01,  ,,,,,,,,,39500,,\n"
        );
        let table = load(&csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.regions(), vec!["Lagos".to_string()]);
        assert_eq!(table.report().blank_region_lines, vec![3, 4]);
        assert_eq!(table.report().imputed_regressors, 0);
    }

    #[test]
    fn header_only_yields_empty_table() {
        let table = load(HEADER).unwrap();
        assert!(table.is_empty());
        assert!(table.regions().is_empty());
    }
}

//! Foodcast Core — price table, series models, forecasting.
//!
//! This crate contains everything needed to go from a historical price CSV to
//! a single-date forecast:
//! - Domain types (items, series keys, observations, forecast results)
//! - CSV loading with date parsing, numeric coercion and regressor imputation
//! - Per-series model fitting (piecewise trend, yearly seasonality, regressor)
//! - Forecasting with seeded uncertainty intervals

pub mod data;
pub mod domain;
pub mod forecast;
pub mod model;
pub mod rng;

pub use data::{DataError, DataSourceConfig, DataStore, Table};
pub use domain::{ForecastRequest, ForecastResult, Item, SeriesKey};
pub use forecast::{Forecaster, PredictError};
pub use model::{FitError, ModelConfig, ModelTrainer, TrainedModel};

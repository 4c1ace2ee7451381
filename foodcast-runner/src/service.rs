//! The request path: table + cached registry + forecaster.

use crate::cache::CachedRegistry;
use crate::config::ForecastConfig;
use crate::registry::{ModelRegistry, RegistryError};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use foodcast_core::data::{DataStore, Table};
use foodcast_core::domain::{ForecastRequest, ForecastResult, Item, SeriesKey};
use foodcast_core::forecast::{Forecaster, PredictError};
use foodcast_core::rng::SampleSeeds;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Predict(#[from] PredictError),
}

/// What a forecast request produced.
///
/// An untrained series is a normal outcome, not an error: it is reported to
/// the user as "no model for this pair".
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    Forecast {
        request: ForecastRequest,
        result: ForecastResult,
    },
    NotTrained(SeriesKey),
}

pub struct ForecastService {
    table: Table,
    models: CachedRegistry,
    forecaster: Forecaster,
}

impl ForecastService {
    pub fn new(table: Table, models: CachedRegistry, forecaster: Forecaster) -> Self {
        Self {
            table,
            models,
            forecaster,
        }
    }

    /// Load the dataset and open the registry described by `config`.
    pub fn from_config(config: &ForecastConfig) -> Result<Self> {
        let table = DataStore::new(config.data.clone())
            .load()
            .context("load price dataset")?;
        let registry = ModelRegistry::new(&config.models.dir)
            .with_context(|| format!("open model directory {}", config.models.dir.display()))?;
        Ok(Self::new(
            table,
            CachedRegistry::new(registry, config.models.cache_capacity),
            Forecaster::new(SampleSeeds::new(config.forecast.seed)),
        ))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn models(&self) -> &CachedRegistry {
        &self.models
    }

    /// Forecast `item` in `region` at `target_date`, with the regressor held
    /// at the region's most recent value.
    pub fn forecast(
        &self,
        region: &str,
        item: Item,
        target_date: NaiveDate,
    ) -> Result<ForecastOutcome, ServiceError> {
        let regressor_value = self
            .table
            .last_regressor_value(region)
            .ok_or_else(|| ServiceError::UnknownRegion(region.to_string()))?;

        let request = ForecastRequest {
            region: region.to_string(),
            item,
            target_date,
            regressor_value,
        };
        let key = request.key();

        let model = match self.models.get(&key) {
            Ok(model) => model,
            Err(RegistryError::ModelNotFound { .. }) => {
                tracing::info!(%key, "no trained model");
                return Ok(ForecastOutcome::NotTrained(key));
            }
            Err(e) => return Err(e.into()),
        };

        let result = self
            .forecaster
            .predict(&model, request.target_date, request.regressor_value)?;
        Ok(ForecastOutcome::Forecast { request, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodcast_core::data::generate_table;
    use foodcast_core::model::ModelTrainer;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service_with_rice_model(dir: &std::path::Path) -> ForecastService {
        let table = generate_table(&["Lagos", "Kano"], ymd(2020, 1, 1), ymd(2022, 12, 31), 30);
        let registry = ModelRegistry::new(dir).unwrap();
        let key = SeriesKey::new("Lagos", Item::Rice);
        let model = ModelTrainer::default()
            .train(&key.region, key.item, &table)
            .unwrap();
        registry.save(&key, &model).unwrap();
        ForecastService::new(table, CachedRegistry::new(registry, 8), Forecaster::default())
    }

    #[test]
    fn trained_pair_returns_forecast() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = service_with_rice_model(temp_dir.path());

        match service.forecast("Lagos", Item::Rice, ymd(2023, 3, 1)).unwrap() {
            ForecastOutcome::Forecast { request, result } => {
                assert_eq!(
                    Some(request.regressor_value),
                    service.table().last_regressor_value("Lagos")
                );
                assert_eq!(result.target_date, ymd(2023, 3, 1));
                assert!(result.is_ordered());
            }
            other => panic!("expected a forecast, got {other:?}"),
        }
    }

    #[test]
    fn untrained_pair_is_not_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = service_with_rice_model(temp_dir.path());

        let outcome = service.forecast("Kano", Item::Rice, ymd(2023, 3, 1)).unwrap();
        assert_eq!(outcome, ForecastOutcome::NotTrained(SeriesKey::new("Kano", Item::Rice)));
    }

    #[test]
    fn unknown_region_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = service_with_rice_model(temp_dir.path());

        let err = service.forecast("Atlantis", Item::Rice, ymd(2023, 3, 1)).unwrap_err();
        assert!(matches!(err, ServiceError::UnknownRegion(r) if r == "Atlantis"));
    }

    #[test]
    fn repeated_requests_hit_the_cache() {
        let temp_dir = tempfile::tempdir().unwrap();
        let service = service_with_rice_model(temp_dir.path());

        let a = service.forecast("Lagos", Item::Rice, ymd(2023, 3, 1)).unwrap();
        let b = service.forecast("Lagos", Item::Rice, ymd(2023, 3, 1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(service.models().len(), 1);
    }
}

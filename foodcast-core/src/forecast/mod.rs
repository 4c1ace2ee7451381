//! Single-step forecasting from a trained model.
//!
//! The future frame is one row: the target date and the regressor held at
//! the region's last observed value. The regressor itself is never forecast.

pub mod sampling;

use crate::domain::ForecastResult;
use crate::model::TrainedModel;
use crate::rng::SampleSeeds;
use chrono::NaiveDate;
use rand_distr::{Distribution, Normal};
use sampling::{quantile, sample_trend};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("regressor value must be finite, got {0}")]
    InvalidRegressor(f64),

    #[error("sampling failed: {0}")]
    Sampling(String),
}

/// The one-row frame handed to the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FutureFrame {
    pub ds: NaiveDate,
    pub regressor_value: f64,
}

/// Produces point forecasts with seeded uncertainty intervals.
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    seeds: SampleSeeds,
}

impl Forecaster {
    pub fn new(seeds: SampleSeeds) -> Self {
        Self { seeds }
    }

    pub fn with_seed(master_seed: u64) -> Self {
        Self::new(SampleSeeds::new(master_seed))
    }

    pub fn seeds(&self) -> &SampleSeeds {
        &self.seeds
    }

    /// Forecast `model` at `target_date` with the regressor held at
    /// `last_regressor_value`.
    pub fn predict(
        &self,
        model: &TrainedModel,
        target_date: NaiveDate,
        last_regressor_value: f64,
    ) -> Result<ForecastResult, PredictError> {
        if !last_regressor_value.is_finite() {
            return Err(PredictError::InvalidRegressor(last_regressor_value));
        }
        let frame = FutureFrame {
            ds: target_date,
            regressor_value: last_regressor_value,
        };

        let scaling = model.scaling();
        let t = scaling.time(frame.ds);
        // Seasonal and regressor terms are deterministic; only trend and noise vary.
        let fixed = model.fixed_component(frame.ds, frame.regressor_value);
        let point = model.point_estimate(frame.ds, frame.regressor_value);

        let n_samples = model.uncertainty_samples();
        if n_samples == 0 {
            return Ok(ForecastResult {
                target_date,
                point_estimate: point,
                lower_bound: point,
                upper_bound: point,
            });
        }

        let noise = Normal::new(0.0, model.sigma_obs())
            .map_err(|e| PredictError::Sampling(e.to_string()))?;
        let mut rng = self.seeds.rng_for(model.key(), target_date);

        let mut samples: Vec<f64> = (0..n_samples)
            .map(|_| {
                let trend_draw = sample_trend(model.trend(), t, &mut rng);
                (trend_draw + fixed + noise.sample(&mut rng)) * scaling.y_scale
            })
            .collect();
        samples.sort_by(|a, b| a.total_cmp(b));

        let tail = (1.0 - model.interval_width()) / 2.0;
        let lower = quantile(&samples, tail).min(point);
        let upper = quantile(&samples, 1.0 - tail).max(point);

        tracing::debug!(
            key = %model.key(),
            %target_date,
            point,
            lower,
            upper,
            "forecast computed"
        );

        Ok(ForecastResult {
            target_date,
            point_estimate: point,
            lower_bound: lower,
            upper_bound: upper,
        })
    }
}

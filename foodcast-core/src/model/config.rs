use serde::{Deserialize, Serialize};

/// Fitting configuration for one series model.
///
/// Defaults reproduce the deployed forecaster: a flexible trend (changepoint
/// prior 0.2) with changepoints confined to the first 85% of the history,
/// yearly seasonality only, loose seasonality regularization (15.0), one
/// additive regressor and a 95% interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub changepoint_prior_scale: f64,
    pub changepoint_range: f64,
    pub n_changepoints: usize,
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    pub seasonality_prior_scale: f64,
    pub regressor_prior_scale: f64,
    pub interval_width: f64,
    pub uncertainty_samples: usize,
    /// Fewer usable observations than this fails with `InsufficientData`.
    pub min_observations: usize,
    /// Reweighting passes for the changepoint (Laplace) prior.
    pub max_iterations: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            changepoint_prior_scale: 0.2,
            changepoint_range: 0.85,
            n_changepoints: 25,
            yearly_seasonality: true,
            weekly_seasonality: false,
            daily_seasonality: false,
            seasonality_prior_scale: 15.0,
            regressor_prior_scale: 10.0,
            interval_width: 0.95,
            uncertainty_samples: 1000,
            min_observations: 24,
            max_iterations: 50,
        }
    }
}

/// A Fourier seasonality block to include in the fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalitySpec {
    pub name: &'static str,
    pub period_days: f64,
    pub fourier_order: usize,
}

impl ModelConfig {
    /// Seasonality blocks enabled by this configuration.
    pub fn seasonalities(&self) -> Vec<SeasonalitySpec> {
        let mut specs = Vec::new();
        if self.yearly_seasonality {
            specs.push(SeasonalitySpec {
                name: "yearly",
                period_days: 365.25,
                fourier_order: 10,
            });
        }
        if self.weekly_seasonality {
            specs.push(SeasonalitySpec {
                name: "weekly",
                period_days: 7.0,
                fourier_order: 3,
            });
        }
        if self.daily_seasonality {
            specs.push(SeasonalitySpec {
                name: "daily",
                period_days: 1.0,
                fourier_order: 4,
            });
        }
        specs
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            ));
        }
        for (name, value) in [
            ("changepoint_prior_scale", self.changepoint_prior_scale),
            ("seasonality_prior_scale", self.seasonality_prior_scale),
            ("regressor_prior_scale", self.regressor_prior_scale),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }
        if self.min_observations < 2 {
            return Err("min_observations must be at least 2".into());
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        Ok(())
    }
}

//! The fitted, serializable series model.
//!
//! A [`TrainedModel`] is produced once by the trainer and never mutated; the
//! registry persists it wholesale and hands out shared read-only references.
//! All component evaluations work in scaled units (target divided by
//! `y_scale`, time mapped to `[0, 1]` over the history).

use crate::domain::{DatasetHash, SeriesKey};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Provenance of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub trained_at: NaiveDateTime,
    pub dataset_hash: DatasetHash,
    pub n_observations: usize,
    pub history_start: NaiveDate,
    pub history_end: NaiveDate,
}

/// Maps calendar dates and prices into the model's fitting space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    pub start: NaiveDate,
    pub t_scale_days: f64,
    pub y_scale: f64,
}

impl Scaling {
    /// Scaled time: 0 at the first observation, 1 at the last.
    pub fn time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.t_scale_days
    }
}

/// Piecewise-linear trend: `k·t + m + Σ δⱼ·max(0, t − sⱼ)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub k: f64,
    pub m: f64,
    pub changepoints_t: Vec<f64>,
    pub deltas: Vec<f64>,
}

impl TrendFit {
    pub fn at(&self, t: f64) -> f64 {
        piecewise_linear(t, self.k, self.m, &self.changepoints_t, &self.deltas)
    }

    /// Mean absolute rate change, the scale for simulated future changepoints.
    pub fn mean_abs_delta(&self) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64
    }
}

pub(crate) fn piecewise_linear(t: f64, k: f64, m: f64, changepoints: &[f64], deltas: &[f64]) -> f64 {
    let bends: f64 = changepoints
        .iter()
        .zip(deltas)
        .map(|(&s, &d)| if t > s { d * (t - s) } else { 0.0 })
        .sum();
    k * t + m + bends
}

/// One Fourier seasonality block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityFit {
    pub name: String,
    pub period_days: f64,
    pub fourier_order: usize,
    /// `[sin₁, cos₁, sin₂, cos₂, …]`
    pub coefficients: Vec<f64>,
}

impl SeasonalityFit {
    pub fn at(&self, date: NaiveDate) -> f64 {
        fourier_terms(date, self.period_days, self.fourier_order)
            .iter()
            .zip(&self.coefficients)
            .map(|(f, c)| f * c)
            .sum()
    }
}

/// Fourier features for a date: `[sin(2πnd/P), cos(2πnd/P)]` for n in 1..=order.
pub(crate) fn fourier_terms(date: NaiveDate, period_days: f64, order: usize) -> Vec<f64> {
    let day = date.num_days_from_ce() as f64;
    let mut terms = Vec::with_capacity(2 * order);
    for n in 1..=order {
        let angle = 2.0 * std::f64::consts::PI * n as f64 * day / period_days;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }
    terms
}

/// The exogenous regressor: standardized, then scaled by one coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorFit {
    pub name: String,
    pub mu: f64,
    pub std: f64,
    pub coefficient: f64,
}

impl RegressorFit {
    pub fn standardize(&self, value: f64) -> f64 {
        (value - self.mu) / self.std
    }

    pub fn effect(&self, value: f64) -> f64 {
        self.coefficient * self.standardize(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    key: SeriesKey,
    meta: ModelMeta,
    scaling: Scaling,
    trend: TrendFit,
    seasonalities: Vec<SeasonalityFit>,
    regressor: RegressorFit,
    /// Observation noise standard deviation, scaled units.
    sigma_obs: f64,
    interval_width: f64,
    uncertainty_samples: usize,
}

impl TrainedModel {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: SeriesKey,
        meta: ModelMeta,
        scaling: Scaling,
        trend: TrendFit,
        seasonalities: Vec<SeasonalityFit>,
        regressor: RegressorFit,
        sigma_obs: f64,
        interval_width: f64,
        uncertainty_samples: usize,
    ) -> Self {
        Self {
            key,
            meta,
            scaling,
            trend,
            seasonalities,
            regressor,
            sigma_obs,
            interval_width,
            uncertainty_samples,
        }
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn scaling(&self) -> &Scaling {
        &self.scaling
    }

    pub fn trend(&self) -> &TrendFit {
        &self.trend
    }

    pub fn seasonalities(&self) -> &[SeasonalityFit] {
        &self.seasonalities
    }

    pub fn regressor(&self) -> &RegressorFit {
        &self.regressor
    }

    pub fn sigma_obs(&self) -> f64 {
        self.sigma_obs
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }

    pub fn uncertainty_samples(&self) -> usize {
        self.uncertainty_samples
    }

    /// Sum of all seasonal blocks at `date`, scaled units.
    pub fn seasonal_at(&self, date: NaiveDate) -> f64 {
        self.seasonalities.iter().map(|s| s.at(date)).sum()
    }

    /// Seasonal plus regressor contribution at `date`, scaled units.
    pub fn fixed_component(&self, date: NaiveDate, regressor_value: f64) -> f64 {
        self.seasonal_at(date) + self.regressor.effect(regressor_value)
    }

    /// Deterministic prediction in price units.
    pub fn point_estimate(&self, date: NaiveDate, regressor_value: f64) -> f64 {
        let t = self.scaling.time(date);
        (self.trend.at(t) + self.fixed_component(date, regressor_value)) * self.scaling.y_scale
    }
}

//! Series model fitting.
//!
//! The model is additive in scaled units:
//!
//! ```text
//! y(t) = trend(t) + Σ seasonality(t) + β·x̃(t) + ε,   ε ~ N(0, σ²)
//! ```
//!
//! Parameters are the MAP estimate under the priors
//! `k, m ~ N(0, 5)`, `δ ~ Laplace(0, changepoint_prior_scale)`,
//! seasonal coefficients `~ N(0, seasonality_prior_scale)` and
//! `β ~ N(0, regressor_prior_scale)`. The Laplace prior is handled by
//! iteratively reweighted penalized least squares: each pass replaces
//! `|δ|/τ` with the quadratic bound at the previous estimate, and σ is
//! re-estimated from the residuals.

use super::config::ModelConfig;
use super::linalg::penalized_least_squares;
use super::trained::{
    fourier_terms, ModelMeta, RegressorFit, Scaling, SeasonalityFit, TrainedModel, TrendFit,
};
use super::FitError;
use crate::data::Table;
use crate::domain::{DatasetHash, Item, Observation, SeriesKey};
use std::borrow::Cow;

const BASE_PRIOR_SCALE: f64 = 5.0;
const MIN_SIGMA_SQ: f64 = 1e-8;
const MIN_ABS_DELTA: f64 = 1e-6;
const CONVERGENCE_TOL: f64 = 1e-8;

pub const REGRESSOR_NAME: &str = "inflation_food_price_index";

/// Fits one model per (region, item) series.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: ModelConfig,
}

impl ModelTrainer {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit the model for `region`/`item` from the rows of `table`.
    pub fn train(&self, region: &str, item: Item, table: &Table) -> Result<TrainedModel, FitError> {
        let key = SeriesKey::new(region, item);
        let observations = table.observations(&key);
        self.fit_observations(key, &observations, table.dataset_hash())
    }

    /// Fit from the observations of a single series, in any row order.
    pub fn fit_observations(
        &self,
        key: SeriesKey,
        observations: &[Observation],
        dataset_hash: &DatasetHash,
    ) -> Result<TrainedModel, FitError> {
        self.config.validate().map_err(FitError::InvalidConfig)?;

        let n = observations.len();
        if n < self.config.min_observations {
            return Err(FitError::InsufficientData {
                key,
                required: self.config.min_observations,
                actual: n,
            });
        }

        let sorted = date_ordered(observations);
        let observations: &[Observation] = &sorted;
        let first = &observations[0];
        let last = &observations[n - 1];
        let span_days = (last.date - first.date).num_days();
        if span_days <= 0 {
            // Every observation falls on one date: no time axis to fit.
            return Err(FitError::InsufficientData {
                key,
                required: 2,
                actual: 1,
            });
        }

        let y_scale = observations
            .iter()
            .map(|o| o.price.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let scaling = Scaling {
            start: first.date,
            t_scale_days: span_days as f64,
            y_scale,
        };

        let t: Vec<f64> = observations.iter().map(|o| scaling.time(o.date)).collect();
        let y: Vec<f64> = observations.iter().map(|o| o.price / y_scale).collect();
        let (mu, std) = standardization(observations);

        let changepoints_t = place_changepoints(&t, &self.config);
        let seasonality_specs = self.config.seasonalities();

        // Column layout: [k, m, δ₁..δc, seasonal blocks..., β]
        let n_cp = changepoints_t.len();
        let n_seasonal: usize = seasonality_specs.iter().map(|s| 2 * s.fourier_order).sum();
        let p = 2 + n_cp + n_seasonal + 1;
        let cp_start = 2;
        let seasonal_start = cp_start + n_cp;
        let regressor_col = p - 1;

        let rows: Vec<Vec<f64>> = observations
            .iter()
            .zip(&t)
            .map(|(obs, &ti)| {
                let mut row = Vec::with_capacity(p);
                row.push(ti);
                row.push(1.0);
                row.extend(changepoints_t.iter().map(|&s| (ti - s).max(0.0)));
                for spec in &seasonality_specs {
                    row.extend(fourier_terms(obs.date, spec.period_days, spec.fourier_order));
                }
                row.push((obs.regressor_value - mu) / std);
                row
            })
            .collect();

        // Gaussian prior precisions; changepoint precisions are reweighted below.
        let mut precision = vec![0.0; p];
        precision[0] = 1.0 / BASE_PRIOR_SCALE.powi(2);
        precision[1] = 1.0 / BASE_PRIOR_SCALE.powi(2);
        for value in precision.iter_mut().take(seasonal_start).skip(cp_start) {
            *value = 1.0 / self.config.changepoint_prior_scale.powi(2);
        }
        for value in precision.iter_mut().take(regressor_col).skip(seasonal_start) {
            *value = 1.0 / self.config.seasonality_prior_scale.powi(2);
        }
        precision[regressor_col] = 1.0 / self.config.regressor_prior_scale.powi(2);

        let mut sigma_sq = initial_sigma_sq(&y);
        let mut beta = vec![0.0; p];

        for iteration in 0..self.config.max_iterations {
            let penalty: Vec<f64> = precision.iter().map(|&prec| sigma_sq * prec).collect();
            let next = penalized_least_squares(&rows, &y, &penalty).ok_or_else(|| {
                FitError::Degenerate {
                    key: key.clone(),
                    reason: "singular normal equations".into(),
                }
            })?;

            let change = next
                .iter()
                .zip(&beta)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0_f64, f64::max);
            beta = next;

            sigma_sq = residual_sigma_sq(&rows, &y, &beta);
            for j in cp_start..seasonal_start {
                let tau = self.config.changepoint_prior_scale;
                precision[j] = 1.0 / (tau * beta[j].abs().max(MIN_ABS_DELTA));
            }

            if iteration > 0 && change < CONVERGENCE_TOL {
                break;
            }
        }

        let mut seasonalities = Vec::with_capacity(seasonality_specs.len());
        let mut offset = seasonal_start;
        for spec in &seasonality_specs {
            let width = 2 * spec.fourier_order;
            seasonalities.push(SeasonalityFit {
                name: spec.name.to_string(),
                period_days: spec.period_days,
                fourier_order: spec.fourier_order,
                coefficients: beta[offset..offset + width].to_vec(),
            });
            offset += width;
        }

        let trend = TrendFit {
            k: beta[0],
            m: beta[1],
            changepoints_t,
            deltas: beta[cp_start..seasonal_start].to_vec(),
        };
        let regressor = RegressorFit {
            name: REGRESSOR_NAME.to_string(),
            mu,
            std,
            coefficient: beta[regressor_col],
        };
        let meta = ModelMeta {
            trained_at: chrono::Utc::now().naive_utc(),
            dataset_hash: dataset_hash.clone(),
            n_observations: n,
            history_start: first.date,
            history_end: last.date,
        };

        tracing::debug!(
            key = %key,
            observations = n,
            changepoints = n_cp,
            sigma = sigma_sq.sqrt(),
            "series fitted"
        );

        Ok(TrainedModel::new(
            key,
            meta,
            scaling,
            trend,
            seasonalities,
            regressor,
            sigma_sq.sqrt(),
            self.config.interval_width,
            self.config.uncertainty_samples,
        ))
    }
}

/// Borrows `observations` when already sorted by date, otherwise sorts a copy.
/// The sort is stable, so rows sharing a date keep their relative order.
fn date_ordered(observations: &[Observation]) -> Cow<'_, [Observation]> {
    if observations.windows(2).all(|w| w[0].date <= w[1].date) {
        Cow::Borrowed(observations)
    } else {
        let mut sorted = observations.to_vec();
        sorted.sort_by_key(|o| o.date);
        Cow::Owned(sorted)
    }
}

/// Mean and sample standard deviation of the regressor. A constant regressor
/// falls back to `|mean|`, then to 1, so standardizing never divides by zero.
fn standardization(observations: &[Observation]) -> (f64, f64) {
    let n = observations.len() as f64;
    let mu = observations.iter().map(|o| o.regressor_value).sum::<f64>() / n;
    let var = observations
        .iter()
        .map(|o| (o.regressor_value - mu).powi(2))
        .sum::<f64>()
        / (n - 1.0).max(1.0);
    let std = var.sqrt();
    let std = if std > 0.0 {
        std
    } else if mu.abs() > 0.0 {
        mu.abs()
    } else {
        1.0
    };
    (mu, std)
}

/// Place up to `n_changepoints` changepoints uniformly over the first
/// `changepoint_range` fraction of the observations, skipping the first row.
fn place_changepoints(t: &[f64], config: &ModelConfig) -> Vec<f64> {
    let hist_size = (t.len() as f64 * config.changepoint_range).floor() as usize;
    let n_changepoints = config.n_changepoints.min(hist_size.saturating_sub(1));
    if n_changepoints == 0 {
        return Vec::new();
    }

    let last_index = (hist_size - 1) as f64;
    (1..=n_changepoints)
        .map(|i| {
            let idx = (i as f64 * last_index / n_changepoints as f64).round() as usize;
            t[idx]
        })
        .collect()
}

fn initial_sigma_sq(y: &[f64]) -> f64 {
    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let var = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    // Start well below the raw variance so the first pass is close to OLS.
    (var * 0.01).max(MIN_SIGMA_SQ)
}

fn residual_sigma_sq(rows: &[Vec<f64>], y: &[f64], beta: &[f64]) -> f64 {
    let rss: f64 = rows
        .iter()
        .zip(y)
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(beta).map(|(x, b)| x * b).sum();
            (target - fitted).powi(2)
        })
        .sum();
    (rss / y.len() as f64).max(MIN_SIGMA_SQ)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(n: usize, step_days: i64, price: impl Fn(usize) -> f64) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n)
            .map(|i| Observation {
                date: start + Duration::days(i as i64 * step_days),
                region: "Lagos".into(),
                item: Item::Rice,
                price: price(i),
                regressor_value: 100.0 + i as f64 * 0.5,
            })
            .collect()
    }

    fn fit(obs: &[Observation]) -> Result<TrainedModel, FitError> {
        ModelTrainer::default().fit_observations(
            SeriesKey::new("Lagos", Item::Rice),
            obs,
            &DatasetHash::from_hash("test"),
        )
    }

    #[test]
    fn too_few_observations_is_insufficient_data() {
        let err = fit(&series(10, 30, |_| 100.0)).unwrap_err();
        match err {
            FitError::InsufficientData {
                required, actual, ..
            } => {
                assert_eq!(required, 24);
                assert_eq!(actual, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn single_date_is_insufficient_data() {
        let obs = series(30, 0, |_| 100.0);
        assert!(matches!(
            fit(&obs).unwrap_err(),
            FitError::InsufficientData { actual: 1, .. }
        ));
    }

    #[test]
    fn changepoints_stay_in_leading_range() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let cps = place_changepoints(&t, &ModelConfig::default());
        assert_eq!(cps.len(), 25);
        assert!(cps.iter().all(|&c| c > 0.0 && c <= 0.85));
        assert!(cps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn short_history_limits_changepoint_count() {
        let t: Vec<f64> = (0..10).map(|i| i as f64 / 9.0).collect();
        let cps = place_changepoints(&t, &ModelConfig::default());
        // floor(10 * 0.85) = 8 rows eligible -> 7 changepoints
        assert_eq!(cps.len(), 7);
    }

    #[test]
    fn constant_regressor_standardizes_to_zero() {
        let mut obs = series(5, 30, |_| 1.0);
        for o in &mut obs {
            o.regressor_value = 110.0;
        }
        let (mu, std) = standardization(&obs);
        assert_eq!(mu, 110.0);
        assert_eq!(std, 110.0);
    }

    #[test]
    fn linear_series_is_recovered() {
        // 3 years of monthly prices on a straight line
        let obs = series(36, 30, |i| 1000.0 + 10.0 * i as f64);
        let model = fit(&obs).unwrap();

        for o in &obs {
            let fitted = model.point_estimate(o.date, o.regressor_value);
            assert!(
                (fitted - o.price).abs() < 15.0,
                "fitted {fitted} vs observed {}",
                o.price
            );
        }
        assert_eq!(model.meta().n_observations, 36);
        assert_eq!(model.scaling().y_scale, 1350.0);
        assert_eq!(model.seasonalities().len(), 1);
        assert_eq!(model.seasonalities()[0].coefficients.len(), 20);
    }

    #[test]
    fn row_order_does_not_change_the_fit() {
        let obs = series(36, 30, |i| {
            1000.0 + 10.0 * i as f64 + if i % 4 == 0 { 40.0 } else { 0.0 }
        });
        let mut shuffled = obs.clone();
        shuffled.reverse();
        shuffled.swap(3, 20);

        let ordered = fit(&obs).unwrap();
        let unordered = fit(&shuffled).unwrap();
        assert_eq!(unordered.scaling(), ordered.scaling());
        assert_eq!(unordered.trend(), ordered.trend());
        assert_eq!(unordered.seasonalities(), ordered.seasonalities());
        assert_eq!(unordered.regressor(), ordered.regressor());
        assert_eq!(unordered.meta().history_start, obs[0].date);
        assert_eq!(unordered.meta().history_end, obs[35].date);
    }

    #[test]
    fn yearly_cycle_is_captured() {
        let obs = series(3 * 365, 1, |i| {
            500.0 + 50.0 * (2.0 * std::f64::consts::PI * i as f64 / 365.25).sin()
        });
        let model = fit(&obs).unwrap();
        let amplitude = model
            .seasonalities()
            .iter()
            .map(|s| s.coefficients.iter().map(|c| c.abs()).sum::<f64>())
            .sum::<f64>()
            * model.scaling().y_scale;
        assert!(amplitude > 20.0, "seasonal amplitude too small: {amplitude}");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let trainer = ModelTrainer::new(ModelConfig {
            changepoint_range: 0.0,
            ..Default::default()
        });
        let err = trainer
            .fit_observations(
                SeriesKey::new("Lagos", Item::Rice),
                &series(30, 30, |_| 1.0),
                &DatasetHash::from_hash("x"),
            )
            .unwrap_err();
        assert!(matches!(err, FitError::InvalidConfig(_)));
    }
}

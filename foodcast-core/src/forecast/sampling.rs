//! Monte Carlo pieces of the uncertainty interval.

use crate::model::trained::{piecewise_linear, TrendFit};
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Draw one trend value at scaled time `t`.
///
/// Inside the history the fitted trend is returned unchanged. Past the end of
/// the history (`t > 1`) new changepoints arrive at the historical rate
/// (changepoint count per unit of scaled time) with Laplace-distributed rate
/// changes whose scale is the mean absolute fitted change.
pub fn sample_trend<R: Rng + ?Sized>(trend: &TrendFit, t: f64, rng: &mut R) -> f64 {
    if t <= 1.0 || trend.changepoints_t.is_empty() {
        return trend.at(t);
    }

    let rate = trend.changepoints_t.len() as f64 * (t - 1.0);
    let n_changes = match Poisson::new(rate) {
        Ok(poisson) => poisson.sample(rng) as usize,
        Err(_) => 0,
    };
    if n_changes == 0 {
        return trend.at(t);
    }

    let scale = trend.mean_abs_delta() + 1e-8;
    let mut changepoints = trend.changepoints_t.clone();
    let mut deltas = trend.deltas.clone();
    for _ in 0..n_changes {
        changepoints.push(1.0 + rng.gen::<f64>() * (t - 1.0));
        deltas.push(sample_laplace(scale, rng));
    }

    piecewise_linear(t, trend.k, trend.m, &changepoints, &deltas)
}

/// Laplace(0, scale) by inverse transform.
pub fn sample_laplace<R: Rng + ?Sized>(scale: f64, rng: &mut R) -> f64 {
    let u = rng.gen::<f64>() - 0.5;
    let tail = (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE);
    -scale * u.signum() * tail.ln()
}

/// Quantile with linear interpolation between order statistics.
///
/// `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

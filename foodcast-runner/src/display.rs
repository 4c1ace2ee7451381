//! Display rounding and formatting of forecasts.
//!
//! Amounts are snapped to a currency granularity (5 Naira by default) before
//! they are shown. Snapping is monotone, so a forecast whose bounds bracket
//! its point estimate still does after rounding.

use chrono::NaiveDate;
use foodcast_core::domain::ForecastResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How exact ties (`x.5` granules) are broken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Ties round away from zero: 825 → 830 at granularity 10.
    #[default]
    HalfUp,
    /// Ties round to the even granule: 825 → 820 at granularity 10.
    HalfEven,
}

/// Snap `value` to the nearest multiple of `granularity`.
///
/// A non-positive granularity leaves the value unchanged.
pub fn round_to_granularity(value: f64, granularity: f64, policy: RoundingPolicy) -> f64 {
    if granularity <= 0.0 || !value.is_finite() {
        return value;
    }
    let granules = value / granularity;
    let rounded = match policy {
        RoundingPolicy::HalfUp => granules.round(),
        RoundingPolicy::HalfEven => round_half_even(granules),
    };
    rounded * granularity
}

fn round_half_even(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 && r % 2.0 != 0.0 {
        r - x.signum()
    } else {
        r
    }
}

/// Format a whole amount with thousands separators: `1234567` → `1,234,567`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Display settings: granularity, tie policy and currency label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub granularity: f64,
    pub rounding: RoundingPolicy,
    pub currency: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            granularity: 5.0,
            rounding: RoundingPolicy::HalfUp,
            currency: "Naira".into(),
        }
    }
}

/// A forecast rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayForecast {
    pub target_date: NaiveDate,
    pub predicted: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub currency: String,
}

impl DisplayForecast {
    pub fn from_result(result: &ForecastResult, config: &DisplayConfig) -> Self {
        let snap = |v: f64| round_to_granularity(v, config.granularity, config.rounding);
        Self {
            target_date: result.target_date,
            predicted: snap(result.point_estimate),
            minimum: snap(result.lower_bound),
            maximum: snap(result.upper_bound),
            currency: config.currency.clone(),
        }
    }

    fn amount(&self, value: f64) -> String {
        format!("{} ({})", format_thousands(value), self.currency)
    }
}

impl fmt::Display for DisplayForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast for {}", self.target_date)?;
        writeln!(f, "  Predicted price:     {}", self.amount(self.predicted))?;
        writeln!(f, "  Minimum price range: {}", self.amount(self.minimum))?;
        write!(f, "  Maximum price range: {}", self.amount(self.maximum))
    }
}

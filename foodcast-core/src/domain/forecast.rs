use super::item::Item;
use super::series::SeriesKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single point-in-time forecast request.
///
/// `regressor_value` is the last observed inflation index for the region;
/// it is held constant into the future.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub region: String,
    pub item: Item,
    pub target_date: NaiveDate,
    pub regressor_value: f64,
}

impl ForecastRequest {
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.region.clone(), self.item)
    }
}

/// Point forecast with its uncertainty interval.
///
/// Invariant: `lower_bound <= point_estimate <= upper_bound`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub target_date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastResult {
    /// Width of the uncertainty interval.
    pub fn interval_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    pub fn is_ordered(&self) -> bool {
        self.lower_bound <= self.point_estimate && self.point_estimate <= self.upper_bound
    }
}

//! Domain types for Foodcast

pub mod forecast;
pub mod ids;
pub mod item;
pub mod series;

pub use forecast::{ForecastRequest, ForecastResult};
pub use ids::DatasetHash;
pub use item::{canonical_token, Item, UnknownItem};
pub use series::{Observation, SeriesKey};

/// Region name alias
pub type Region = String;

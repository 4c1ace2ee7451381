//! Series model: configuration, fitting, and the trained artifact.

pub mod config;
pub mod linalg;
pub mod trained;
pub mod trainer;

pub use config::{ModelConfig, SeasonalitySpec};
pub use trained::{ModelMeta, RegressorFit, Scaling, SeasonalityFit, TrainedModel, TrendFit};
pub use trainer::{ModelTrainer, REGRESSOR_NAME};

use crate::domain::SeriesKey;
use thiserror::Error;

/// Errors from fitting a single series.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("insufficient data for {key}: need at least {required} observations, got {actual}")]
    InsufficientData {
        key: SeriesKey,
        required: usize,
        actual: usize,
    },

    #[error("fit failed for {key}: {reason}")]
    Degenerate { key: SeriesKey, reason: String },

    #[error("invalid model config: {0}")]
    InvalidConfig(String),
}

//! Serializable application configuration, loaded from TOML.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields the deployed settings:
//!
//! ```toml
//! [data]
//! path = "FPAM.csv"
//!
//! [models]
//! dir = "models"
//! cache_capacity = 64
//!
//! [model]
//! changepoint_prior_scale = 0.2
//! interval_width = 0.95
//!
//! [forecast]
//! seed = 42
//!
//! [display]
//! granularity = 5.0
//! rounding = "half_up"
//! currency = "Naira"
//!
//! [training]
//! parallel = true
//! ```

use crate::display::DisplayConfig;
use foodcast_core::data::DataSourceConfig;
use foodcast_core::model::ModelConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where trained artifacts live and how many stay in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub dir: PathBuf,
    pub cache_capacity: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            cache_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Master seed for interval sampling.
    pub seed: u64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub data: DataSourceConfig,
    pub models: ModelsConfig,
    pub model: ModelConfig,
    pub forecast: ForecastSettings,
    pub display: DisplayConfig,
    pub training: TrainingConfig,
}

impl ForecastConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate().map_err(ConfigError::Invalid)?;

        if self.models.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "models.cache_capacity must be at least 1".into(),
            ));
        }
        if !(self.display.granularity > 0.0 && self.display.granularity.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "display.granularity must be positive, got {}",
                self.display.granularity
            )));
        }
        if self.data.date_column.is_empty()
            || self.data.region_column.is_empty()
            || self.data.regressor_column.is_empty()
        {
            return Err(ConfigError::Invalid("data column names must not be empty".into()));
        }
        Ok(())
    }
}

//! Foodcast Runner — configuration, batch training, model registry, serving.
//!
//! This crate builds on `foodcast-core` to provide:
//! - TOML configuration with per-field defaults
//! - On-disk model registry with atomic writes
//! - LRU cache of loaded models
//! - Parallel batch training over every (region, item) pair
//! - The forecast request path and display rounding

pub mod cache;
pub mod config;
pub mod display;
pub mod registry;
pub mod service;
pub mod training;

pub use cache::CachedRegistry;
pub use config::{ConfigError, ForecastConfig, ForecastSettings, ModelsConfig, TrainingConfig};
pub use display::{round_to_granularity, DisplayConfig, DisplayForecast, RoundingPolicy};
pub use registry::{artifact_name, ModelRegistry, RegistryError};
pub use service::{ForecastOutcome, ForecastService, ServiceError};
pub use training::{BatchTrainer, LogProgress, TrainFailure, TrainingProgress, TrainingSummary};

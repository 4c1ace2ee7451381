//! Offline batch training over every (region, item) pair.
//!
//! Pairs are independent: each task fits its own model and writes its own
//! artifact, so the parallel path shares nothing mutable. A failing pair never
//! aborts the batch.

use crate::registry::{ModelRegistry, RegistryError};
use foodcast_core::data::Table;
use foodcast_core::domain::SeriesKey;
use foodcast_core::model::{FitError, ModelTrainer};
use rayon::prelude::*;
use std::path::PathBuf;
use thiserror::Error;

/// Why a pair produced no artifact.
#[derive(Debug, Error)]
pub enum TrainFailure {
    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Save(#[from] RegistryError),
}

impl TrainFailure {
    /// Insufficient history is expected for sparse pairs; it is a skip, not a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, TrainFailure::Fit(FitError::InsufficientData { .. }))
    }
}

/// Outcome of one pair.
pub type PairResult = Result<PathBuf, TrainFailure>;

/// Progress callback for batch training. Called from worker threads.
pub trait TrainingProgress: Sync {
    fn on_start(&self, total: usize);

    fn on_pair_complete(&self, key: &SeriesKey, result: &PairResult);

    fn on_batch_complete(&self, summary: &TrainingSummary);
}

/// Reports progress through `tracing`.
pub struct LogProgress;

impl TrainingProgress for LogProgress {
    fn on_start(&self, total: usize) {
        tracing::info!(total, "training started");
    }

    fn on_pair_complete(&self, key: &SeriesKey, result: &PairResult) {
        match result {
            Ok(path) => tracing::info!(%key, path = %path.display(), "model trained"),
            Err(e) if e.is_skip() => tracing::warn!(%key, "skipped: {e}"),
            Err(e) => tracing::error!(%key, "training failed: {e}"),
        }
    }

    fn on_batch_complete(&self, summary: &TrainingSummary) {
        tracing::info!(
            total = summary.total,
            trained = summary.trained,
            skipped = summary.skipped,
            failed = summary.failed,
            "training finished"
        );
    }
}

/// Counts for a finished batch.
#[derive(Debug, Default)]
pub struct TrainingSummary {
    pub total: usize,
    pub trained: usize,
    pub skipped: usize,
    pub failed: usize,
    pub skipped_keys: Vec<SeriesKey>,
    pub errors: Vec<(SeriesKey, TrainFailure)>,
}

impl TrainingSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, key: SeriesKey, result: PairResult) {
        match result {
            Ok(_) => self.trained += 1,
            Err(e) if e.is_skip() => {
                self.skipped += 1;
                self.skipped_keys.push(key);
            }
            Err(e) => {
                self.failed += 1;
                self.errors.push((key, e));
            }
        }
    }
}

/// Trains and saves one model per pair, optionally in parallel.
pub struct BatchTrainer {
    trainer: ModelTrainer,
    registry: ModelRegistry,
    parallel: bool,
}

impl BatchTrainer {
    pub fn new(trainer: ModelTrainer, registry: ModelRegistry) -> Self {
        Self {
            trainer,
            registry,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Train every region × item pair in `table`.
    pub fn train_all(&self, table: &Table, progress: &dyn TrainingProgress) -> TrainingSummary {
        self.train_keys(table, table.series_keys(), progress)
    }

    /// Train only the given pairs.
    pub fn train_keys(
        &self,
        table: &Table,
        keys: Vec<SeriesKey>,
        progress: &dyn TrainingProgress,
    ) -> TrainingSummary {
        progress.on_start(keys.len());

        let run = |key: SeriesKey| {
            let result = self.train_one(table, &key);
            progress.on_pair_complete(&key, &result);
            (key, result)
        };

        let results: Vec<(SeriesKey, PairResult)> = if self.parallel {
            keys.into_par_iter().map(run).collect()
        } else {
            keys.into_iter().map(run).collect()
        };

        let mut summary = TrainingSummary {
            total: results.len(),
            ..Default::default()
        };
        for (key, result) in results {
            summary.record(key, result);
        }

        progress.on_batch_complete(&summary);
        summary
    }

    fn train_one(&self, table: &Table, key: &SeriesKey) -> PairResult {
        let model = self.trainer.train(&key.region, key.item, table)?;
        Ok(self.registry.save(key, &model)?)
    }
}

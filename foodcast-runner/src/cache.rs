//! In-memory LRU cache in front of the model registry.

use crate::registry::{ModelRegistry, RegistryError};
use foodcast_core::domain::SeriesKey;
use foodcast_core::model::TrainedModel;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shares loaded models between requests.
///
/// Models are held as `Arc<TrainedModel>`; a cache hit clones the `Arc`, never
/// the model. Lookups that fail (including `ModelNotFound`) are not cached,
/// so a model trained after a miss is picked up on the next request.
pub struct CachedRegistry {
    registry: ModelRegistry,
    cache: Mutex<LruCache<SeriesKey, Arc<TrainedModel>>>,
}

impl CachedRegistry {
    /// Wraps `registry` with room for `capacity` models (at least one).
    pub fn new(registry: ModelRegistry, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            registry,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// The model for `key`, from memory if present, else from disk.
    pub fn get(&self, key: &SeriesKey) -> Result<Arc<TrainedModel>, RegistryError> {
        if let Some(model) = self.lock().get(key) {
            tracing::debug!(%key, "model cache hit");
            return Ok(Arc::clone(model));
        }

        tracing::debug!(%key, "model cache miss");
        // Loaded without holding the lock; two concurrent misses may both
        // read the artifact, and the later insert wins.
        let model = Arc::new(self.registry.load(key)?);
        self.lock().put(key.clone(), Arc::clone(&model));
        Ok(model)
    }

    /// Whether `key` is currently held in memory.
    pub fn is_cached(&self, key: &SeriesKey) -> bool {
        self.lock().contains(key)
    }

    /// Drop `key` from memory; the artifact is untouched.
    pub fn invalidate(&self, key: &SeriesKey) {
        self.lock().pop(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    // Poisoning is ignored: the LRU holds no partially-applied state.
    fn lock(&self) -> MutexGuard<'_, LruCache<SeriesKey, Arc<TrainedModel>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Bounded in-memory registry of loaded models.
//!
//! The cache is the only shared mutable state on the inference path. Its
//! lock is held across the check/insert/evict steps only — never across a
//! load, which can block on network fetch and compilation. Two workers
//! missing on the same cold id may both load it; the first insert wins and
//! the map stays consistent either way.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use tracing::debug;

use crate::model::LoadedModel;

/// Default maximum number of resident model handles.
pub const DEFAULT_MODEL_CACHE_CAPACITY: usize = 3;

/// LRU map from model id to loaded model handle.
pub struct ModelCache {
    entries: Mutex<LruCache<String, Arc<dyn LoadedModel>>>,
}

impl ModelCache {
    /// A cache holding at most `capacity` handles (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Arc<dyn LoadedModel>>> {
        // A poisoned lock only means another worker panicked mid-access;
        // the map itself is still structurally sound.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached handle for `model_id`, refreshing its recency.
    pub fn get(&self, model_id: &str) -> Option<Arc<dyn LoadedModel>> {
        self.lock().get(model_id).cloned()
    }

    /// Return the cached handle or load one with `load`.
    ///
    /// The load runs outside the lock. If a concurrent worker loaded the
    /// same id in the meantime, its handle wins and the redundant load is
    /// discarded, so repeated calls for one id converge on a single handle.
    /// Inserting may evict the least-recently-used entry.
    pub fn get_or_load<F>(&self, model_id: &str, load: F) -> anyhow::Result<Arc<dyn LoadedModel>>
    where
        F: FnOnce() -> anyhow::Result<Arc<dyn LoadedModel>>,
    {
        if let Some(handle) = self.get(model_id) {
            return Ok(handle);
        }

        debug!(model_id, "model cache miss, loading");
        let loaded = load()?;

        let mut entries = self.lock();
        if let Some(existing) = entries.get(model_id) {
            return Ok(Arc::clone(existing));
        }
        entries.put(model_id.to_string(), Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Whether a handle is resident, without touching recency.
    pub fn contains(&self, model_id: &str) -> bool {
        self.lock().contains(model_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

//! Process-wide memoization of loaded model artifacts.
//!
//! Artifacts are expensive to deserialize and immutable once loaded, so
//! the first successful load per key is shared for the process lifetime.
//! Loads run outside the lock; two concurrent misses on the same key may
//! both load, and the first insert wins. Failed loads are never cached so
//! a later retry can succeed once files appear.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

pub struct ModelCache<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> std::fmt::Debug for ModelCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("entries", &"<RwLock>")
            .finish()
    }
}

impl<K: Eq + Hash + Clone, V> ModelCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        match self.entries.read() {
            Ok(guard) => guard.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    /// Returns the cached artifact for `key`, running `loader` on a miss.
    /// Loader errors propagate to the caller and leave the cache untouched.
    pub fn get_or_load<E>(
        &self,
        key: &K,
        loader: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }

        let loaded = Arc::new(loader()?);

        let mut guard = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("ModelCache: Lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };
        // Another request may have published while we were loading.
        let entry = guard.entry(key.clone()).or_insert(loaded);
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V> Default for ModelCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

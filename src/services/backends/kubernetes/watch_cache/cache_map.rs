
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Name-keyed map shared between the watch worker and the readers of the cache.
///
/// Every operation takes the single lock for exactly one mutation or one copy.
pub struct CacheMap<V> {
    entries: Mutex<HashMap<String, Arc<V>>>,
}

impl<V> CacheMap<V> {
    pub fn new() -> Self {
        CacheMap {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stores `value` under `name`, returning the value it replaced
    pub fn upsert(&self, name: String, value: Arc<V>) -> Option<Arc<V>> {
        self.lock().insert(name, value)
    }

    /// Removes `name`. Removing an absent name is a no-op.
    pub fn remove(&self, name: &str) -> Option<Arc<V>> {
        self.lock().remove(name)
    }

    /// Copies the current values out of the map in no particular order
    pub fn snapshot(&self) -> Vec<Arc<V>> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<V>> {
        self.lock().get(name).cloned()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    // No operation can panic halfway through a mutation, a poisoned map is still consistent
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Default for CacheMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{KeyValueStore, StorageError};

/// Process-local store. Clones share the same slots.
///
/// [`MemoryStore::set_unavailable`] makes every call fail, which is how tests
/// exercise the storage-unavailable fallbacks.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    slots: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated backend failure.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.lock();
        if state.unavailable {
            return Err(StorageError::Unavailable(format!("cannot read {key}")));
        }
        Ok(state.slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(StorageError::Unavailable(format!("cannot write {key}")));
        }
        state.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(StorageError::Unavailable(format!("cannot remove {key}")));
        }
        state.slots.remove(key);
        Ok(())
    }
}

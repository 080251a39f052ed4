//! In-memory object store
//!
//! Shared between every handle opened from the same `MemoryBackend`, so a
//! test can back up through one handle and inspect through another. Also
//! supports injecting failures and counting put calls.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Backend, ObjectEntry, ObjectStore};
use crate::error::{VaultError, VaultResult};

#[derive(Debug, Default)]
struct MemoryState {
    namespaces: HashMap<String, BTreeMap<String, Vec<u8>>>,
    put_calls: usize,
    fail_puts: bool,
    failing_deletes: HashSet<String>,
    reverse_listing: bool,
}

/// In-process backend
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle bound to one namespace
    pub fn store(&self, namespace: &str) -> MemoryObjectStore {
        MemoryObjectStore {
            namespace: namespace.to_string(),
            state: Arc::clone(&self.state),
        }
    }

    /// Number of put calls across all namespaces
    pub fn put_calls(&self) -> usize {
        self.lock().put_calls
    }

    /// Make every subsequent put fail
    pub fn fail_puts(&self, fail: bool) {
        self.lock().fail_puts = fail;
    }

    /// Make deletes of `key` fail in any namespace
    pub fn fail_delete(&self, key: &str) {
        self.lock().failing_deletes.insert(key.to_string());
    }

    /// Return listings in descending key order, to catch callers that trust listing order
    pub fn reverse_listing(&self, reverse: bool) {
        self.lock().reverse_listing = reverse;
    }

    /// Keys currently stored in a namespace, sorted
    pub fn keys(&self, namespace: &str) -> Vec<String> {
        self.lock()
            .namespaces
            .get(namespace)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        lock_state(&self.state)
    }
}

impl Backend for MemoryBackend {
    fn open(&self, namespace: &str) -> VaultResult<Box<dyn ObjectStore>> {
        Ok(Box::new(self.store(namespace)))
    }
}

/// Handle to one namespace of a `MemoryBackend`
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    namespace: String,
    state: Arc<Mutex<MemoryState>>,
}

impl ObjectStore for MemoryObjectStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn put(&self, key: &str, bytes: &[u8]) -> VaultResult<()> {
        let mut state = lock_state(&self.state);
        state.put_calls += 1;
        if state.fail_puts {
            return Err(VaultError::storage("put", key, "injected put failure"));
        }
        state
            .namespaces
            .entry(self.namespace.clone())
            .or_default()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> VaultResult<Vec<u8>> {
        lock_state(&self.state)
            .namespaces
            .get(&self.namespace)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| VaultError::NotFound {
                namespace: self.namespace.clone(),
                key: key.to_string(),
            })
    }

    fn list(&self, prefix: &str) -> VaultResult<Vec<ObjectEntry>> {
        let state = lock_state(&self.state);
        let mut entries: Vec<ObjectEntry> = state
            .namespaces
            .get(&self.namespace)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(key, _)| key.starts_with(prefix))
                    .map(|(key, bytes)| ObjectEntry {
                        key: key.clone(),
                        size_bytes: bytes.len() as u64,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if state.reverse_listing {
            entries.reverse();
        }
        Ok(entries)
    }

    fn delete(&self, key: &str) -> VaultResult<()> {
        let mut state = lock_state(&self.state);
        if state.failing_deletes.contains(key) {
            return Err(VaultError::storage("delete", key, "injected delete failure"));
        }
        if let Some(objects) = state.namespaces.get_mut(&self.namespace) {
            objects.remove(key);
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> VaultResult<bool> {
        Ok(lock_state(&self.state)
            .namespaces
            .get(&self.namespace)
            .is_some_and(|objects| objects.contains_key(key)))
    }
}

// A poisoned lock only means another test thread panicked mid-call; the map is still usable.
fn lock_state(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

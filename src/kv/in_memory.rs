//! InMemoryKeyValueStore - HashMap-backed key-value store for tests and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{KeyValueStore, KvError};

/// In-memory key-value store backed by a HashMap.
///
/// Clone-friendly via Arc: clones share storage. An optional quota bounds the
/// total size of all keys and values in bytes, so storage-full failures can
/// be reproduced without a real device.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    storage: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store holding at most `bytes` of keys plus values.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            storage: Arc::default(),
            quota: Some(bytes),
        }
    }

    /// Delete a key. Returns the previous value.
    pub fn remove(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| KvError::Poisoned("remove"))?;
        Ok(storage.remove(key))
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, KvError> {
        let storage = self.storage.read().map_err(|_| KvError::Poisoned("keys"))?;
        let mut keys: Vec<String> = storage.keys().cloned().collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// Total bytes currently used by keys and values.
    pub fn used_bytes(&self) -> Result<usize, KvError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| KvError::Poisoned("used_bytes"))?;
        Ok(Self::usage(&storage))
    }

    fn usage(storage: &HashMap<String, String>) -> usize {
        storage.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let storage = self.storage.read().map_err(|_| KvError::Poisoned("get"))?;
        Ok(storage.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut storage = self.storage.write().map_err(|_| KvError::Poisoned("set"))?;

        if let Some(quota) = self.quota {
            let replaced = storage.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let available = quota.saturating_sub(Self::usage(&storage) - replaced);
            let needed = key.len() + value.len();
            if needed > available {
                return Err(KvError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        storage.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

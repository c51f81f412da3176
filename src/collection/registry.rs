//! Collections - lazily opened stores sharing one key-value store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use super::{CollectionStore, EntityView, StoreOptions, TypedCollection};
use crate::error::{Result, StoreError};
use crate::kv::KeyValueStore;
use crate::lock::MutationLocks;
use crate::record::Record;

/// Registry of collection stores over one shared key-value store.
///
/// A collection is opened, and seeded if needed, the first time its entity
/// key is requested; later requests return the same store. All stores opened
/// here take their mutation lock from one `MutationLocks`, keyed by storage
/// key.
pub struct Collections<K> {
    kv: K,
    options: StoreOptions,
    locks: MutationLocks,
    stores: Mutex<HashMap<String, Arc<CollectionStore<K>>>>,
}

impl<K: KeyValueStore + Clone> Collections<K> {
    pub fn new(kv: K, options: StoreOptions) -> Self {
        Self {
            kv,
            options,
            locks: MutationLocks::new(),
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Get the store for `entity_key`, opening it on first access.
    ///
    /// `seed` is only called when the store is opened and nothing usable is
    /// persisted for it.
    pub fn open(
        &self,
        entity_key: &str,
        seed: impl FnOnce() -> Vec<Record>,
    ) -> Result<Arc<CollectionStore<K>>> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StoreError::State("collection registry poisoned".into()))?;

        if let Some(store) = stores.get(entity_key) {
            return Ok(store.clone());
        }

        let storage_key = format!("{}{}", self.options.key_prefix, entity_key);
        let store = Arc::new(CollectionStore::open_with_lock(
            self.kv.clone(),
            entity_key.to_string(),
            seed(),
            self.options.clone(),
            self.locks.get_lock(&storage_key),
        )?);
        info!(collection = %entity_key, records = store.len(), "opened collection");

        stores.insert(entity_key.to_string(), store.clone());
        Ok(store)
    }

    /// Typed access to the collection of `V`, opening it on first access.
    pub fn open_typed<V: EntityView>(
        &self,
        seed: impl FnOnce() -> Vec<Record>,
    ) -> Result<TypedCollection<K, V>> {
        Ok(self.open(V::COLLECTION, seed)?.typed())
    }

    /// The store for `entity_key` if it has been opened.
    pub fn get(&self, entity_key: &str) -> Option<Arc<CollectionStore<K>>> {
        self.stores.lock().ok()?.get(entity_key).cloned()
    }

    /// Entity keys opened so far, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .stores
            .lock()
            .map(|stores| stores.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }
}

//! Typed views layered over schema-less records.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::CollectionStore;
use crate::error::{Result, StoreError};
use crate::kv::KeyValueStore;
use crate::query::{ListOptions, Page};
use crate::record::{Record, ID_FIELD};
use crate::validation::FormRules;

/// Trait for entity-specific typed views of a collection's records.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Clone, EntityView)]
/// #[entity(collection = "inventory", rules = "inventory_rules")]
/// struct InventoryItem {
///     #[serde(default)]
///     pub id: String,
///     pub name: String,
/// }
/// ```
pub trait EntityView: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The entity key of the collection holding this view (e.g. "inventory").
    const COLLECTION: &'static str;

    /// Returns the record id. Empty before the store assigns one.
    fn id(&self) -> &str;

    /// Field rules checked before a view is created or updated.
    fn rules() -> FormRules {
        FormRules::new()
    }

    fn to_record(&self) -> Result<Record> {
        let value = serde_json::to_value(self).map_err(|e| StoreError::Serde(e.to_string()))?;
        Record::try_from(value)
    }

    fn from_record(record: Record) -> Result<Self> {
        let id = record.id().unwrap_or_default().to_string();
        serde_json::from_value(record.into_value()).map_err(|e| {
            StoreError::Serde(format!("{} record {id:?}: {e}", Self::COLLECTION))
        })
    }
}

/// Typed accessor for one collection.
///
/// Validates against `V::rules()` before every create and update; the
/// underlying `CollectionStore` itself stays schema-agnostic.
pub struct TypedCollection<K, V> {
    store: Arc<CollectionStore<K>>,
    _marker: PhantomData<fn() -> V>,
}

impl<K, V> Clone for TypedCollection<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K: KeyValueStore> CollectionStore<K> {
    /// Typed access to this collection.
    pub fn typed<V: EntityView>(self: &Arc<Self>) -> TypedCollection<K, V> {
        TypedCollection::new(self.clone())
    }
}

impl<K: KeyValueStore, V: EntityView> TypedCollection<K, V> {
    pub fn new(store: Arc<CollectionStore<K>>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// The underlying record store.
    pub fn store(&self) -> &Arc<CollectionStore<K>> {
        &self.store
    }

    pub async fn create(&self, view: &V) -> Result<V> {
        let record = view.to_record()?;
        V::rules().validate(&record)?;
        V::from_record(self.store.create(record).await?)
    }

    pub async fn read(&self, id: &str) -> Result<Option<V>> {
        self.store.read(id).await?.map(V::from_record).transpose()
    }

    /// Merge `patch` into the record `id`. The merged result is validated
    /// under the collection's mutation lock, against the record it replaces.
    pub async fn update(&self, id: &str, patch: Record) -> Result<V> {
        let store = &self.store;
        let updated = store
            .run(
                "update",
                store.rewrite(id, |current| {
                    let record = super::merged(current, patch);
                    V::rules().validate(&record)?;
                    Ok(record)
                }),
            )
            .await?;
        V::from_record(updated)
    }

    /// Replace record `id` with `view`. Fields `view` leaves out, such as
    /// `None` options skipped on serialization, are removed from the record.
    pub async fn save(&self, id: &str, view: &V) -> Result<V> {
        let mut record = view.to_record()?;
        record.insert(ID_FIELD, id);
        V::rules().validate(&record)?;
        V::from_record(self.store.replace(id, record).await?)
    }

    pub async fn remove(&self, id: &str) -> Result<bool> {
        self.store.remove(id).await
    }

    pub async fn bulk_delete<S: AsRef<str>>(&self, ids: &[S]) -> Result<bool> {
        self.store.bulk_delete(ids).await
    }

    pub async fn list(&self, options: ListOptions) -> Result<Page<V>> {
        self.store.list(options).await?.try_map(V::from_record)
    }
}

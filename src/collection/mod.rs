//! Local collection store - persisted CRUD and queries over one entity type.
//!
//! A `CollectionStore` owns the ordered records of one collection (for
//! example `"inventory"`), keeps them in memory, and writes the whole
//! collection to a `KeyValueStore` after every mutation. On open it loads the
//! persisted collection, or falls back to a seed collection and persists it.
//!
//! ## Example
//!
//! ```ignore
//! use erp_store::{CollectionStore, InMemoryKeyValueStore, ListOptions, Record, StoreOptions};
//!
//! let store = CollectionStore::open(InMemoryKeyValueStore::new(), "inventory", seed, StoreOptions::default())?;
//! let item = store.create(Record::new().with("name", "Desk").with("quantity", 5)).await?;
//! let page = store.list(ListOptions::new().sort_by("quantity").page_size(10)).await?;
//! ```

mod registry;
mod typed;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::id;
use crate::kv::KeyValueStore;
use crate::latency::Latency;
use crate::lock::MutationLock;
use crate::query::{self, ListOptions, Page, DEFAULT_PAGE_SIZE};
use crate::record::{Record, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
use crate::timestamp;

pub use registry::Collections;
pub use typed::{EntityView, TypedCollection};

/// Tunables shared by every store a registry opens.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub latency: Latency,
    /// Prepended to the entity key to form the storage key.
    pub key_prefix: String,
    pub default_page_size: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            latency: Latency::default(),
            key_prefix: String::new(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StoreOptions {
    /// Options without simulated latency.
    pub fn immediate() -> Self {
        Self {
            latency: Latency::None,
            ..Self::default()
        }
    }
}

/// The published state of a collection.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<Record>>,
    /// Bumped once per persisted mutation.
    pub revision: u64,
    /// Operations started but not yet finished.
    pub in_flight: usize,
    /// Error of the most recent failed operation, cleared when the next one starts.
    pub last_error: Option<StoreError>,
}

impl Snapshot {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

enum Mutation<T> {
    Write(Vec<Record>, T),
    Unchanged(T),
}

pub struct CollectionStore<K> {
    entity_key: String,
    storage_key: String,
    kv: K,
    options: StoreOptions,
    mutation_lock: Arc<MutationLock>,
    state: watch::Sender<Snapshot>,
}

impl<K: KeyValueStore> CollectionStore<K> {
    /// Open the collection `entity_key`, seeding it from `seed` when nothing
    /// usable is persisted yet.
    pub fn open(
        kv: K,
        entity_key: impl Into<String>,
        seed: Vec<Record>,
        options: StoreOptions,
    ) -> Result<Self> {
        Self::open_with_lock(kv, entity_key.into(), seed, options, Arc::default())
    }

    pub(crate) fn open_with_lock(
        kv: K,
        entity_key: String,
        seed: Vec<Record>,
        options: StoreOptions,
        mutation_lock: Arc<MutationLock>,
    ) -> Result<Self> {
        if entity_key.is_empty() {
            return Err(StoreError::State("entity key must not be empty".into()));
        }
        let storage_key = format!("{}{}", options.key_prefix, entity_key);
        let records = Self::load(&kv, &entity_key, &storage_key, seed)?;

        let (state, _) = watch::channel(Snapshot {
            records: Arc::new(records),
            revision: 0,
            in_flight: 0,
            last_error: None,
        });

        Ok(Self {
            entity_key,
            storage_key,
            kv,
            options,
            mutation_lock,
            state,
        })
    }

    fn load(kv: &K, entity_key: &str, storage_key: &str, seed: Vec<Record>) -> Result<Vec<Record>> {
        match kv.get(storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Record>>(&raw) {
                Ok(records) => match duplicate_id(&records) {
                    None => {
                        debug!(collection = %entity_key, count = records.len(), "loaded persisted collection");
                        return Ok(records);
                    }
                    Some(id) => {
                        warn!(collection = %entity_key, %id, "persisted collection repeats an id, falling back to seed");
                    }
                },
                Err(err) => {
                    warn!(collection = %entity_key, error = %err, "persisted collection is malformed, falling back to seed");
                }
            },
            Ok(None) => {
                debug!(collection = %entity_key, count = seed.len(), "no persisted collection, seeding");
            }
            Err(err) => {
                warn!(collection = %entity_key, error = %err, "failed to read persisted collection, falling back to seed");
            }
        }

        if let Some(dup) = duplicate_id(&seed) {
            return Err(StoreError::DuplicateId {
                collection: entity_key.to_string(),
                id: dup,
            });
        }

        Self::write(kv, storage_key, &seed)?;
        Ok(seed)
    }

    fn write(kv: &K, storage_key: &str, records: &[Record]) -> Result<()> {
        let raw = serde_json::to_string(records).map_err(|e| StoreError::Serde(e.to_string()))?;
        kv.set(storage_key, &raw)?;
        Ok(())
    }

    pub fn entity_key(&self) -> &str {
        &self.entity_key
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Latest in-memory records. Never waits on a pending persist.
    pub fn records(&self) -> Arc<Vec<Record>> {
        self.state.borrow().records.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive every published snapshot: one per mutation, per `refresh`, and
    /// per change of the in-flight count.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    /// Re-publish the current snapshot to subscribers. No I/O.
    pub fn refresh(&self) {
        self.state.send_modify(|_| {});
    }

    /// Append a new record.
    ///
    /// Assigns an id when `item` has none (or an empty one) and stamps
    /// `created_at` / `updated_at` with the current time.
    pub async fn create(&self, item: Record) -> Result<Record> {
        self.run("create", async move {
            self.commit(|records| {
                let mut record = item;
                let id = match record.get(ID_FIELD) {
                    Some(Value::String(id)) if !id.is_empty() => {
                        if records.iter().any(|r| r.id() == Some(id.as_str())) {
                            return Err(StoreError::DuplicateId {
                                collection: self.entity_key.clone(),
                                id: id.clone(),
                            });
                        }
                        id.clone()
                    }
                    None | Some(Value::Null) | Some(Value::String(_)) => {
                        id::generate_unique(|candidate| records.iter().any(|r| r.id() == Some(candidate)))
                    }
                    Some(other) => {
                        return Err(StoreError::State(format!("record id must be a string, got {other}")));
                    }
                };

                let now = timestamp::now();
                record.insert(ID_FIELD, id);
                record.insert(CREATED_AT_FIELD, now.clone());
                record.insert(UPDATED_AT_FIELD, now);

                let mut next = Vec::with_capacity(records.len() + 1);
                next.extend_from_slice(records);
                next.push(record.clone());
                Ok(Mutation::Write(next, record))
            })
            .await
        })
        .await
    }

    /// Look up a record by id. A missing id is `None`, not an error.
    pub async fn read(&self, id: &str) -> Result<Option<Record>> {
        self.run("read", async move {
            Ok(self.records().iter().find(|r| r.id() == Some(id)).cloned())
        })
        .await
    }

    /// Merge `patch` into the record `id` and refresh its `updated_at`.
    ///
    /// `id` and `created_at` are never changed: a patch carrying the same id
    /// is accepted, a different id is rejected, and `created_at` /
    /// `updated_at` in the patch are ignored. Fails with `NotFound` when `id`
    /// is absent.
    pub async fn update(&self, id: &str, patch: Record) -> Result<Record> {
        self.run("update", self.rewrite(id, |current| Ok(merged(current, patch))))
            .await
    }

    /// Replace every field of the record `id` with those of `record`.
    ///
    /// Fields missing from `record` are dropped. `id` and `created_at` are
    /// kept and `updated_at` is refreshed, as for `update`.
    pub async fn replace(&self, id: &str, record: Record) -> Result<Record> {
        self.run("replace", self.rewrite(id, |_| Ok(record))).await
    }

    /// Swap the record `id` for the one `build` derives from it, under the
    /// mutation lock. The maintained fields always come from the stored
    /// record; a built record carrying a different id is rejected.
    async fn rewrite(&self, id: &str, build: impl FnOnce(&Record) -> Result<Record>) -> Result<Record> {
        self.commit(|records| {
            let index = records
                .iter()
                .position(|r| r.id() == Some(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: self.entity_key.clone(),
                    id: id.to_string(),
                })?;
            let current = &records[index];

            let mut next = build(current)?;
            if let Some(next_id) = next.remove(ID_FIELD) {
                if next_id.as_str() != Some(id) {
                    return Err(StoreError::State(format!(
                        "record id is immutable: cannot change {id} to {next_id}"
                    )));
                }
            }
            next.remove(CREATED_AT_FIELD);
            next.insert(ID_FIELD, id);
            if let Some(created_at) = current.get(CREATED_AT_FIELD) {
                next.insert(CREATED_AT_FIELD, created_at.clone());
            }
            next.insert(UPDATED_AT_FIELD, timestamp::refreshed_after(current.updated_at()));

            let mut collection = records.to_vec();
            collection[index] = next.clone();
            Ok(Mutation::Write(collection, next))
        })
        .await
    }

    /// Remove the record `id`. Removing an absent id succeeds without a write.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        self.run("remove", async move {
            self.commit(|records| {
                if !records.iter().any(|r| r.id() == Some(id)) {
                    return Ok(Mutation::Unchanged(true));
                }
                let next = records.iter().filter(|r| r.id() != Some(id)).cloned().collect();
                Ok(Mutation::Write(next, true))
            })
            .await
        })
        .await
    }

    /// Remove every record whose id is in `ids`, with a single write.
    /// Absent ids are ignored.
    pub async fn bulk_delete<S: AsRef<str>>(&self, ids: &[S]) -> Result<bool> {
        let doomed: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        self.run("bulk_delete", async move {
            self.commit(|records| {
                let next: Vec<Record> = records
                    .iter()
                    .filter(|r| !r.id().is_some_and(|id| doomed.contains(id)))
                    .cloned()
                    .collect();
                if next.len() == records.len() {
                    return Ok(Mutation::Unchanged(true));
                }
                Ok(Mutation::Write(next, true))
            })
            .await
        })
        .await
    }

    /// Replace the whole collection with `records`, typically the seed.
    pub async fn reset(&self, records: Vec<Record>) -> Result<()> {
        self.run("reset", async move {
            if let Some(id) = duplicate_id(&records) {
                return Err(StoreError::DuplicateId {
                    collection: self.entity_key.clone(),
                    id,
                });
            }
            self.commit(|_| Ok(Mutation::Write(records, ()))).await
        })
        .await
    }

    /// Filter, sort and paginate the current records.
    pub async fn list(&self, options: ListOptions) -> Result<Page<Record>> {
        self.run("list", async move {
            query::run(&self.records(), &options, self.options.default_page_size)
        })
        .await
    }

    /// Wait out the simulated latency, then run `op`, tracking it in the
    /// snapshot's in-flight count and last error.
    async fn run<T>(&self, op: &'static str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let _in_flight = InFlight::begin(&self.state);
        self.options.latency.wait().await;

        let result = fut.await;
        match &result {
            Ok(_) => debug!(collection = %self.entity_key, op, "operation completed"),
            Err(err) => {
                warn!(collection = %self.entity_key, op, error = %err, "operation failed");
                self.state.send_modify(|s| s.last_error = Some(err.clone()));
            }
        }
        result
    }

    /// Apply a mutation under the collection's mutation lock: compute the next
    /// collection from the current one, persist it, then publish it. A failed
    /// persist leaves the in-memory records untouched.
    async fn commit<T>(&self, apply: impl FnOnce(&[Record]) -> Result<Mutation<T>>) -> Result<T> {
        let _guard = self.mutation_lock.lock().await;
        let current = self.records();

        match apply(current.as_slice())? {
            Mutation::Unchanged(out) => Ok(out),
            Mutation::Write(next, out) => {
                Self::write(&self.kv, &self.storage_key, &next)?;
                self.state.send_modify(|s| {
                    s.records = Arc::new(next);
                    s.revision += 1;
                });
                Ok(out)
            }
        }
    }
}

/// `current` with `patch` laid over it. Timestamps in the patch are ignored.
fn merged(current: &Record, mut patch: Record) -> Record {
    patch.remove(CREATED_AT_FIELD);
    patch.remove(UPDATED_AT_FIELD);
    let mut record = current.clone();
    record.merge(patch);
    record
}

fn duplicate_id(records: &[Record]) -> Option<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(Record::id)
        .find(|id| !seen.insert(*id))
        .map(str::to_string)
}

/// Counts one running operation; the count drops even if the operation's
/// future is dropped before completion.
struct InFlight<'a> {
    state: &'a watch::Sender<Snapshot>,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a watch::Sender<Snapshot>) -> Self {
        state.send_modify(|s| {
            s.in_flight += 1;
            s.last_error = None;
        });
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

//! Key-value store doubles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use erp_store::{InMemoryKeyValueStore, KeyValueStore, KvError, Record};

/// In-memory store that counts writes.
#[derive(Clone, Default)]
pub struct RecordingKv {
    inner: InMemoryKeyValueStore,
    writes: Arc<AtomicUsize>,
}

impl RecordingKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// The collection persisted under `key`.
    pub fn persisted(&self, key: &str) -> Vec<Record> {
        let raw = self.inner.get(key).unwrap().expect("collection persisted");
        serde_json::from_str(&raw).unwrap()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).unwrap()
    }

    /// Store `value` without counting it as a write.
    pub fn set_raw(&self, key: &str, value: &str) {
        self.inner.set(key, value).unwrap();
    }
}

impl KeyValueStore for RecordingKv {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }
}

/// In-memory store whose reads and writes can be switched to fail.
#[derive(Clone, Default)]
pub struct FlakyKv {
    inner: InMemoryKeyValueStore,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &InMemoryKeyValueStore {
        &self.inner
    }
}

impl KeyValueStore for FlakyKv {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KvError::Io("disk unavailable".into()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KvError::Io("disk full".into()));
        }
        self.inner.set(key, value)
    }
}

pub fn item(id: &str, quantity: i64) -> Record {
    Record::new().with("id", id).with("quantity", quantity)
}

//! Per-key mutation locks.
//!
//! Every mutation of a collection runs "compute next collection, persist,
//! publish" while holding the lock for the collection's storage key, so the
//! value written to the durable store is exactly the result of the mutation
//! that wrote it. `tokio::sync::Mutex` queues waiters in FIFO order, which
//! gives each key a single-flight mutation queue.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Async lock serializing the mutations of one collection.
pub type MutationLock = tokio::sync::Mutex<()>;

/// Lazily creates one `MutationLock` per key and hands out the same `Arc`
/// for repeated lookups.
#[derive(Default)]
pub struct MutationLocks {
    locks: Mutex<HashMap<String, Arc<MutationLock>>>,
}

impl MutationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for `key`.
    pub fn get_lock(&self, key: &str) -> Arc<MutationLock> {
        // The map holds no invariant a panicking holder could break.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(MutationLock::new(())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Durable key-value storage - the persistence substrate for collections.
//!
//! A collection is persisted as one value: the JSON array of its records,
//! stored under the collection's storage key. Implementations only need
//! string `get` / `set`.
//!
//! ## Example
//!
//! ```ignore
//! use erp_store::{InMemoryKeyValueStore, KeyValueStore};
//!
//! let kv = InMemoryKeyValueStore::with_quota(5 * 1024 * 1024);
//! kv.set("inventory", "[]")?;
//! assert_eq!(kv.get("inventory")?.as_deref(), Some("[]"));
//! ```

mod file;
mod in_memory;

use std::sync::Arc;

use thiserror::Error;

/// Error type for key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// Writing the value would exceed the store's byte quota.
    #[error("storage quota exceeded writing {key}: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
    /// The key cannot be stored by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    /// Underlying I/O failure.
    #[error("storage io error: {0}")]
    Io(String),
    /// The in-memory map lock was poisoned.
    #[error("storage lock poisoned during {0}")]
    Poisoned(&'static str),
}

impl From<std::io::Error> for KvError {
    fn from(err: std::io::Error) -> Self {
        KvError::Io(err.to_string())
    }
}

/// String key-value persistence.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`. Returns None if absent.
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        (**self).set(key, value)
    }
}

pub use file::FileKeyValueStore;
pub use in_memory::InMemoryKeyValueStore;

//! Persisted collection stores for the modules of an ERP front end.
//!
//! Each entity type (inventory, sales, purchases, ...) lives in a
//! [`CollectionStore`]: an ordered, in-memory collection of schema-less
//! [`Record`]s that is written in full to a [`KeyValueStore`] after every
//! mutation and seeded from defaults the first time it is opened.
//! [`Collections`] opens stores lazily over one shared key-value store;
//! [`TypedCollection`] layers a typed, validated view on top.

extern crate self as erp_store;

mod collection;
mod error;
mod lock;
mod record;

pub mod config;
pub mod id;
pub mod kv;
pub mod latency;
pub mod logging;
pub mod modules;
pub mod query;
#[cfg(feature = "http")]
pub mod remote;
pub mod roles;
pub mod timestamp;
pub mod validation;

pub use collection::{
    CollectionStore, Collections, EntityView, Snapshot, StoreOptions, TypedCollection,
};
pub use error::{Result, StoreError};
pub use kv::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, KvError};
pub use latency::Latency;
pub use lock::{MutationLock, MutationLocks};
pub use modules::Module;
pub use query::{ListOptions, Page, Pagination, SortOrder};
pub use record::{compare_fields, records_from_json, Record, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
pub use roles::{Action, CurrentUser, GuardedCollection, Role};
pub use validation::{FormRules, Rule, ValidationErrors};

pub use erp_store_macros::EntityView;

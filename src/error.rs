use thiserror::Error;

use crate::kv::KvError;
use crate::roles::{Action, Role};
use crate::validation::ValidationErrors;

/// Error type for collection store operations.
///
/// `read`, `remove` and `bulk_delete` never produce `NotFound`: a missing id
/// is a `None` / no-op there. Only `update` treats a missing id as an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// `update` targeted an id that is not in the collection.
    #[error("record not found: {collection}:{id}")]
    NotFound { collection: String, id: String },

    /// An explicit id passed to `create` is already taken.
    #[error("duplicate record id: {collection}:{id}")]
    DuplicateId { collection: String, id: String },

    /// Durable store read/write failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Serialization or typed-view conversion failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Operation invoked with malformed arguments.
    #[error("invalid arguments: {0}")]
    State(String),

    /// Field-level validation failed.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The acting role may not perform this action.
    #[error("{role} may not {action} records in {collection}")]
    Forbidden {
        role: Role,
        action: Action,
        collection: String,
    },
}

impl From<KvError> for StoreError {
    fn from(err: KvError) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        StoreError::Validation(errors)
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

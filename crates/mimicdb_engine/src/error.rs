//! Error types for the object-store engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in object-store engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Named store does not exist in the engine.
    #[error("store not found: {name}")]
    StoreNotFound {
        /// Name of the store.
        name: String,
    },

    /// Named index does not exist on the store.
    #[error("index not found: {index} on store {store}")]
    IndexNotFound {
        /// Store that was searched.
        store: String,
        /// Name of the missing index.
        index: String,
    },

    /// A row submitted for write carries no usable key.
    #[error("row has no {key_field} key in store {store}")]
    MissingKey {
        /// Store the row was destined for.
        store: String,
        /// Name of the key member.
        key_field: String,
    },

    /// A write would violate a unique index.
    #[error("unique index {index} violated in store {store}: key {key:?} already maps to {existing}")]
    UniqueViolation {
        /// Store of the violated index.
        store: String,
        /// Name of the violated index.
        index: String,
        /// The duplicate key components.
        key: Vec<String>,
        /// Primary key of the row already holding the key.
        existing: String,
    },

    /// A multi-store write batch failed for one or more rows.
    ///
    /// Rows committed before the failures remain committed; `messages`
    /// aggregates every per-row error in the batch.
    #[error("transaction failed on store {store}: {}", messages.join("; "))]
    TransactionFailed {
        /// First store a row failed in.
        store: String,
        /// All per-row error messages, in commit order.
        messages: Vec<String>,
    },

    /// Structural open requested a version below the current one.
    #[error("version regression: requested {requested}, engine is at {current}")]
    VersionRegression {
        /// The requested structural version.
        requested: u32,
        /// The engine's current structural version.
        current: u32,
    },

    /// The engine handle is closed.
    #[error("engine is closed")]
    Closed,
}

impl EngineError {
    /// Creates a store-not-found error.
    pub fn store_not_found(name: impl Into<String>) -> Self {
        Self::StoreNotFound { name: name.into() }
    }

    /// Creates an index-not-found error.
    pub fn index_not_found(store: impl Into<String>, index: impl Into<String>) -> Self {
        Self::IndexNotFound {
            store: store.into(),
            index: index.into(),
        }
    }
}

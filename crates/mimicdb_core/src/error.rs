//! Error types for MimicDB core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in MimicDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Object-store engine error.
    #[error("engine error: {0}")]
    Engine(#[from] mimicdb_engine::EngineError),

    /// Sidecar storage error.
    #[error("sidecar error: {0}")]
    Sidecar(#[from] mimicdb_storage::StorageError),

    /// Settings (de)serialization error.
    #[error("settings codec error: {0}")]
    Settings(#[from] serde_json::Error),

    /// An entity carries no usable primary-key value.
    #[error("primary key {key} missing or empty on entity for store {store}")]
    PrimaryKeyMissing {
        /// Store the entity was destined for.
        store: String,
        /// The declared primary-key property.
        key: String,
    },

    /// A store was referenced before any options were registered for it.
    #[error("no options registered for store {store}")]
    StoreNotRegistered {
        /// Name of the store.
        store: String,
    },

    /// A named trigger does not exist on the store.
    #[error("trigger {name} not found on store {store}")]
    TriggerNotFound {
        /// Store that was searched.
        store: String,
        /// Name of the missing trigger.
        name: String,
    },

    /// A row expected to exist was not found.
    #[error("entity {key} not found in store {store}")]
    EntityNotFound {
        /// Store that was searched.
        store: String,
        /// The primary key that was not found.
        key: String,
    },

    /// Link traversal revisited a store: the declared link graph is cyclic.
    #[error("link cycle detected at store {store}")]
    LinkCycle {
        /// Store at which the cycle was detected.
        store: String,
    },

    /// Content handed to a write operation is not an object or an array of
    /// objects.
    #[error("invalid content: {message}")]
    InvalidContent {
        /// Description of the shape problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a primary-key-missing fault.
    pub fn primary_key_missing(store: impl Into<String>, key: impl Into<String>) -> Self {
        Self::PrimaryKeyMissing {
            store: store.into(),
            key: key.into(),
        }
    }

    /// Creates a store-not-registered fault.
    pub fn store_not_registered(store: impl Into<String>) -> Self {
        Self::StoreNotRegistered {
            store: store.into(),
        }
    }

    /// Creates a trigger-not-found fault.
    pub fn trigger_not_found(store: impl Into<String>, name: impl Into<String>) -> Self {
        Self::TriggerNotFound {
            store: store.into(),
            name: name.into(),
        }
    }

    /// Creates an entity-not-found fault.
    pub fn entity_not_found(store: impl Into<String>, key: impl Into<String>) -> Self {
        Self::EntityNotFound {
            store: store.into(),
            key: key.into(),
        }
    }

    /// Creates a link-cycle fault.
    pub fn link_cycle(store: impl Into<String>) -> Self {
        Self::LinkCycle {
            store: store.into(),
        }
    }

    /// Creates an invalid-content fault.
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}

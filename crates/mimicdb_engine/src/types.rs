//! Structural and batch types for the object-store engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of a secondary index on an object store.
///
/// Single-path indices are named after their dot path; compound (trigger)
/// indices carry an explicit name and an ordered list of dot paths. Index
/// keys are the stringified scalar values resolved at each path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name, unique per store.
    pub name: String,
    /// Ordered dot paths forming the (possibly compound) key.
    pub key_paths: Vec<String>,
    /// Whether the index rejects duplicate keys across distinct rows.
    pub unique: bool,
}

impl IndexDef {
    /// Creates a single-path index named after its path.
    #[must_use]
    pub fn single(path: impl Into<String>, unique: bool) -> Self {
        let path = path.into();
        Self {
            name: path.clone(),
            key_paths: vec![path],
            unique,
        }
    }

    /// Creates a named compound index over the given paths.
    #[must_use]
    pub fn compound(name: impl Into<String>, key_paths: Vec<String>) -> Self {
        Self {
            name: name.into(),
            key_paths,
            unique: false,
        }
    }
}

/// Structural definition of one object store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSchema {
    /// Store name.
    pub name: String,
    /// Indices the store must carry (append-only; existing ones are kept).
    pub indices: Vec<IndexDef>,
}

impl StoreSchema {
    /// Creates a schema for a store with the given indices.
    #[must_use]
    pub fn new(name: impl Into<String>, indices: Vec<IndexDef>) -> Self {
        Self {
            name: name.into(),
            indices,
        }
    }
}

/// A structural mutation plan applied by [`super::StorageEngine::open`].
///
/// Plans are append-then-prune: stores in `create` are created if missing
/// and gain any missing indices; stores in `remove` are dropped entirely;
/// `drop_indices` removes named indices from stores that survive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaPlan {
    /// Target structural version (monotonically increasing).
    pub version: u32,
    /// Stores to create or update.
    pub create: Vec<StoreSchema>,
    /// Stores to remove, with their rows and indices.
    pub remove: Vec<String>,
    /// Named indices to drop from surviving stores: (store, index names).
    pub drop_indices: Vec<(String, Vec<String>)>,
}

/// Rows queued for one store within a [`WriteBatch`].
#[derive(Debug, Clone)]
pub struct StoreWrites {
    /// Target store.
    pub store: String,
    /// Rows to insert or overwrite, each carrying `__pkey__`.
    pub rows: Vec<Value>,
}

/// An ordered multi-store write committed as one engine transaction.
///
/// Stores commit in queue order, rows in row order. Per-row failures are
/// aggregated; rows committed before a failure stay committed.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    /// Per-store write queues in commit order.
    pub writes: Vec<StoreWrites>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rows for a store, keeping one queue per store name.
    pub fn push(&mut self, store: &str, rows: Vec<Value>) {
        if let Some(existing) = self.writes.iter_mut().find(|w| w.store == store) {
            existing.rows.extend(rows);
        } else {
            self.writes.push(StoreWrites {
                store: store.to_string(),
                rows,
            });
        }
    }

    /// Returns `true` if no rows are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.iter().all(|w| w.rows.is_empty())
    }
}

/// Per-store outcome of a committed write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWriteSummary {
    /// Store the rows were committed to.
    pub store: String,
    /// Number of rows committed.
    pub rows_written: usize,
}

//! The engine seam and its in-memory reference implementation.

use crate::error::{EngineError, EngineResult};
use crate::store::ObjectStore;
use crate::types::{SchemaPlan, StoreWriteSummary, WriteBatch};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Bound;

/// The object-store engine seam.
///
/// All coordinators share a single engine handle process-wide. Every
/// operation is a suspension point; callers compose them sequentially.
/// The structural contract mirrors an embedded versioned object database:
/// [`open`](Self::open) applies a [`SchemaPlan`] at a bumped version
/// (closing any previous handle state first), data outlives close/open
/// cycles, and [`delete_database`](Self::delete_database) wipes everything.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Opens the engine at the plan's version, applying its structural
    /// mutations. A previous open handle is closed first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::VersionRegression`] if the plan's version is
    /// below the engine's current version.
    async fn open(&self, plan: &SchemaPlan) -> EngineResult<u32>;

    /// Closes the handle. Data is retained for the next open.
    async fn close(&self);

    /// Returns the current structural version.
    async fn version(&self) -> u32;

    /// Commits a multi-store write batch.
    ///
    /// Stores commit in queue order, rows in row order. Per-row failures
    /// are aggregated into [`EngineError::TransactionFailed`]; rows
    /// committed before a failure stay committed.
    async fn execute(&self, batch: WriteBatch) -> EngineResult<Vec<StoreWriteSummary>>;

    /// Returns the row stored under `key`.
    async fn get(&self, store: &str, key: &str) -> EngineResult<Option<Value>>;

    /// Returns all rows of a store in key order.
    async fn get_all(&self, store: &str) -> EngineResult<Vec<Value>>;

    /// Returns rows whose index key equals `key`, in index order.
    async fn get_by_index(
        &self,
        store: &str,
        index: &str,
        key: &[String],
    ) -> EngineResult<Vec<Value>>;

    /// Bounded range query against a (possibly compound) index.
    async fn range(
        &self,
        store: &str,
        index: &str,
        lower: Bound<Vec<String>>,
        upper: Bound<Vec<String>>,
    ) -> EngineResult<Vec<Value>>;

    /// Deletes the row stored under `key`, returning `true` if it existed.
    async fn delete(&self, store: &str, key: &str) -> EngineResult<bool>;

    /// Removes every row of a store, keeping its structure.
    async fn clear(&self, store: &str) -> EngineResult<()>;

    /// Returns the number of rows in a store.
    async fn count(&self, store: &str) -> EngineResult<usize>;

    /// Returns the names of all stores.
    async fn store_names(&self) -> Vec<String>;

    /// Returns the index names of a store.
    async fn index_names(&self, store: &str) -> EngineResult<Vec<String>>;

    /// Returns the index definitions of a store.
    async fn index_defs(&self, store: &str) -> EngineResult<Vec<crate::types::IndexDef>>;

    /// Returns `true` if the store carries the named index.
    async fn has_index(&self, store: &str, index: &str) -> EngineResult<bool>;

    /// Wipes all stores, indices and versioning state.
    async fn delete_database(&self) -> EngineResult<()>;
}

#[derive(Debug, Default)]
struct EngineInner {
    version: u32,
    open: bool,
    stores: HashMap<String, ObjectStore>,
}

/// The in-memory reference engine.
///
/// Data survives close/open cycles within the instance, the way the host
/// environment's embedded database outlives individual connections.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    inner: RwLock<EngineInner>,
}

impl MemoryEngine {
    /// Creates a fresh engine with no stores and version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(inner: &EngineInner) -> EngineResult<()> {
        if inner.open {
            Ok(())
        } else {
            Err(EngineError::Closed)
        }
    }

    fn store<'a>(inner: &'a EngineInner, name: &str) -> EngineResult<&'a ObjectStore> {
        inner
            .stores
            .get(name)
            .ok_or_else(|| EngineError::store_not_found(name))
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn open(&self, plan: &SchemaPlan) -> EngineResult<u32> {
        let mut inner = self.inner.write();
        if plan.version < inner.version {
            return Err(EngineError::VersionRegression {
                requested: plan.version,
                current: inner.version,
            });
        }
        // A still-open handle is closed before the structural upgrade.
        inner.open = false;

        for name in &plan.remove {
            inner.stores.remove(name);
        }
        for schema in &plan.create {
            let store = inner.stores.entry(schema.name.clone()).or_default();
            store.ensure_indices(&schema.name, &schema.indices);
        }
        for (store_name, index_names) in &plan.drop_indices {
            if let Some(store) = inner.stores.get_mut(store_name) {
                store.drop_indices(index_names);
            }
        }

        inner.version = plan.version;
        inner.open = true;
        tracing::debug!(
            version = inner.version,
            stores = inner.stores.len(),
            "engine opened"
        );
        Ok(inner.version)
    }

    async fn close(&self) {
        self.inner.write().open = false;
    }

    async fn version(&self) -> u32 {
        self.inner.read().version
    }

    async fn execute(&self, batch: WriteBatch) -> EngineResult<Vec<StoreWriteSummary>> {
        let mut inner = self.inner.write();
        Self::ensure_open(&inner)?;

        let mut summaries = Vec::with_capacity(batch.writes.len());
        let mut failed_store: Option<String> = None;
        let mut messages = Vec::new();

        for writes in batch.writes {
            let store = inner
                .stores
                .get_mut(&writes.store)
                .ok_or_else(|| EngineError::store_not_found(&writes.store))?;

            let mut rows_written = 0;
            for row in writes.rows {
                match store.put(&writes.store, row) {
                    Ok(()) => rows_written += 1,
                    Err(e) => {
                        failed_store.get_or_insert_with(|| writes.store.clone());
                        messages.push(e.to_string());
                    }
                }
            }
            summaries.push(StoreWriteSummary {
                store: writes.store,
                rows_written,
            });
        }

        match failed_store {
            // Committed rows stay committed; the error carries every
            // per-row message from the batch.
            Some(store) => Err(EngineError::TransactionFailed { store, messages }),
            None => {
                tracing::debug!(stores = summaries.len(), "batch committed");
                Ok(summaries)
            }
        }
    }

    async fn get(&self, store: &str, key: &str) -> EngineResult<Option<Value>> {
        let inner = self.inner.read();
        Self::ensure_open(&inner)?;
        Ok(Self::store(&inner, store)?.get(key).cloned())
    }

    async fn get_all(&self, store: &str) -> EngineResult<Vec<Value>> {
        let inner = self.inner.read();
        Self::ensure_open(&inner)?;
        Ok(Self::store(&inner, store)?.all())
    }

    async fn get_by_index(
        &self,
        store: &str,
        index: &str,
        key: &[String],
    ) -> EngineResult<Vec<Value>> {
        let inner = self.inner.read();
        Self::ensure_open(&inner)?;
        let object_store = Self::store(&inner, store)?;
        let idx = object_store
            .index(index)
            .ok_or_else(|| EngineError::index_not_found(store, index))?;
        Ok(idx
            .lookup(key)
            .iter()
            .filter_map(|pkey| object_store.get(pkey).cloned())
            .collect())
    }

    async fn range(
        &self,
        store: &str,
        index: &str,
        lower: Bound<Vec<String>>,
        upper: Bound<Vec<String>>,
    ) -> EngineResult<Vec<Value>> {
        let inner = self.inner.read();
        Self::ensure_open(&inner)?;
        let object_store = Self::store(&inner, store)?;
        let idx = object_store
            .index(index)
            .ok_or_else(|| EngineError::index_not_found(store, index))?;
        Ok(idx
            .range(lower, upper)
            .iter()
            .filter_map(|pkey| object_store.get(pkey).cloned())
            .collect())
    }

    async fn delete(&self, store: &str, key: &str) -> EngineResult<bool> {
        let mut inner = self.inner.write();
        Self::ensure_open(&inner)?;
        let object_store = inner
            .stores
            .get_mut(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        Ok(object_store.delete(key))
    }

    async fn clear(&self, store: &str) -> EngineResult<()> {
        let mut inner = self.inner.write();
        Self::ensure_open(&inner)?;
        let object_store = inner
            .stores
            .get_mut(store)
            .ok_or_else(|| EngineError::store_not_found(store))?;
        object_store.clear();
        Ok(())
    }

    async fn count(&self, store: &str) -> EngineResult<usize> {
        let inner = self.inner.read();
        Self::ensure_open(&inner)?;
        Ok(Self::store(&inner, store)?.len())
    }

    async fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().stores.keys().cloned().collect();
        names.sort();
        names
    }

    async fn index_names(&self, store: &str) -> EngineResult<Vec<String>> {
        let inner = self.inner.read();
        Ok(Self::store(&inner, store)?.index_names())
    }

    async fn index_defs(&self, store: &str) -> EngineResult<Vec<crate::types::IndexDef>> {
        let inner = self.inner.read();
        Ok(Self::store(&inner, store)?.index_defs())
    }

    async fn has_index(&self, store: &str, index: &str) -> EngineResult<bool> {
        let inner = self.inner.read();
        Ok(Self::store(&inner, store)?.index(index).is_some())
    }

    async fn delete_database(&self) -> EngineResult<()> {
        let mut inner = self.inner.write();
        inner.stores.clear();
        inner.version = 0;
        inner.open = false;
        tracing::debug!("database wiped");
        Ok(())
    }
}

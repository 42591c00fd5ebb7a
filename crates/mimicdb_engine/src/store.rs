//! A single object store: rows plus their indices.

use crate::error::{EngineError, EngineResult};
use crate::index::StoreIndex;
use crate::types::IndexDef;
use mimicdb_value::PKEY;
use serde_json::Value;
use std::collections::BTreeMap;

/// One named object store.
///
/// Rows are JSON objects keyed by their `__pkey__` member. Writes with a
/// colliding key overwrite the existing row (last-write-wins); indices are
/// kept consistent on every put, delete and clear.
#[derive(Debug, Default)]
pub struct ObjectStore {
    rows: BTreeMap<String, Value>,
    indices: BTreeMap<String, StoreIndex>,
}

impl ObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures the given indices exist, backfilling new ones from current
    /// rows. Existing indices are left untouched (append-only structure).
    pub fn ensure_indices(&mut self, store_name: &str, defs: &[IndexDef]) {
        for def in defs {
            if self.indices.contains_key(&def.name) {
                continue;
            }
            let mut index = StoreIndex::new(def.clone());
            for (pkey, row) in &self.rows {
                index.insert(pkey, row);
            }
            tracing::trace!(store = store_name, index = %def.name, "index created");
            self.indices.insert(def.name.clone(), index);
        }
    }

    /// Removes the named indices, ignoring unknown names.
    pub fn drop_indices(&mut self, names: &[String]) {
        for name in names {
            self.indices.remove(name);
        }
    }

    /// Returns the names of all indices on this store.
    #[must_use]
    pub fn index_names(&self) -> Vec<String> {
        self.indices.keys().cloned().collect()
    }

    /// Returns the definitions of all indices on this store.
    #[must_use]
    pub fn index_defs(&self) -> Vec<IndexDef> {
        self.indices.values().map(|index| index.def().clone()).collect()
    }

    /// Returns the named index, if present.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&StoreIndex> {
        self.indices.get(name)
    }

    /// Inserts or overwrites a row.
    ///
    /// The row must carry a string `__pkey__`; unique indices are checked
    /// before any state changes so a rejected row leaves the store intact.
    pub fn put(&mut self, store_name: &str, row: Value) -> EngineResult<()> {
        let pkey = row
            .get(PKEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| EngineError::MissingKey {
                store: store_name.to_string(),
                key_field: PKEY.to_string(),
            })?;

        for index in self.indices.values() {
            if let Some(key) = index.key_for(&row) {
                if let Some(existing) = index.conflicting_pkey(&key, &pkey) {
                    return Err(EngineError::UniqueViolation {
                        store: store_name.to_string(),
                        index: index.def().name.clone(),
                        key,
                        existing,
                    });
                }
            }
        }

        if let Some(previous) = self.rows.get(&pkey) {
            for index in self.indices.values_mut() {
                index.remove(&pkey, previous);
            }
        }
        for index in self.indices.values_mut() {
            index.insert(&pkey, &row);
        }
        self.rows.insert(pkey, row);
        Ok(())
    }

    /// Returns the row stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.rows.get(key)
    }

    /// Returns all rows in key order.
    #[must_use]
    pub fn all(&self) -> Vec<Value> {
        self.rows.values().cloned().collect()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Deletes the row stored under `key`, returning `true` if it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.rows.remove(key) {
            Some(row) => {
                for index in self.indices.values_mut() {
                    index.remove(key, &row);
                }
                true
            }
            None => false,
        }
    }

    /// Removes every row, keeping the index structure.
    pub fn clear(&mut self) {
        self.rows.clear();
        for index in self.indices.values_mut() {
            index.clear();
        }
    }
}

//! Secondary index maintenance and queries.

use crate::types::IndexDef;
use mimicdb_value::resolve_path;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// A secondary index over one object store.
///
/// Entries map resolved key tuples to the primary keys of rows carrying
/// them. Compound keys order lexicographically component-by-component, so
/// range queries over a key prefix work the way the trigger lookup needs.
#[derive(Debug, Clone)]
pub struct StoreIndex {
    def: IndexDef,
    entries: BTreeMap<Vec<String>, BTreeSet<String>>,
}

impl StoreIndex {
    /// Creates an empty index for the given definition.
    #[must_use]
    pub fn new(def: IndexDef) -> Self {
        Self {
            def,
            entries: BTreeMap::new(),
        }
    }

    /// Returns the index definition.
    #[must_use]
    pub fn def(&self) -> &IndexDef {
        &self.def
    }

    /// Resolves the index key for a row.
    ///
    /// Every key path must resolve to an indexable scalar (string or
    /// number); booleans, arrays, objects, null and missing members make
    /// the row invisible to this index.
    #[must_use]
    pub fn key_for(&self, row: &Value) -> Option<Vec<String>> {
        let mut key = Vec::with_capacity(self.def.key_paths.len());
        for path in &self.def.key_paths {
            let component = match resolve_path(row, path)? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            key.push(component);
        }
        Some(key)
    }

    /// Returns the primary key already holding `key`, if it belongs to a
    /// different row than `pkey`. Used for unique-index checks before a put.
    #[must_use]
    pub fn conflicting_pkey(&self, key: &[String], pkey: &str) -> Option<String> {
        if !self.def.unique {
            return None;
        }
        self.entries
            .get(key)?
            .iter()
            .find(|existing| existing.as_str() != pkey)
            .cloned()
    }

    /// Records a row under its resolved key, if it has one.
    pub fn insert(&mut self, pkey: &str, row: &Value) {
        if let Some(key) = self.key_for(row) {
            self.entries.entry(key).or_default().insert(pkey.to_string());
        }
    }

    /// Removes a row's entry for its resolved key, if it had one.
    pub fn remove(&mut self, pkey: &str, row: &Value) {
        if let Some(key) = self.key_for(row) {
            let emptied = match self.entries.get_mut(&key) {
                Some(pkeys) => {
                    pkeys.remove(pkey);
                    pkeys.is_empty()
                }
                None => false,
            };
            if emptied {
                self.entries.remove(&key);
            }
        }
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Exact lookup: primary keys of rows whose resolved key equals `key`.
    #[must_use]
    pub fn lookup(&self, key: &[String]) -> Vec<String> {
        self.entries
            .get(key)
            .map(|pkeys| pkeys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Bounded range query over key tuples, in key order.
    #[must_use]
    pub fn range(
        &self,
        lower: Bound<Vec<String>>,
        upper: Bound<Vec<String>>,
    ) -> Vec<String> {
        let mut result = Vec::new();
        let mut seen = BTreeSet::new();
        for (_, pkeys) in self.entries.range((lower, upper)) {
            for pkey in pkeys {
                if seen.insert(pkey.clone()) {
                    result.push(pkey.clone());
                }
            }
        }
        result
    }
}

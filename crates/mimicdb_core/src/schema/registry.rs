//! The durable settings registry.
//!
//! Options, link edges, triggers and pending structural mutations live in
//! process memory and are serialized wholesale to the sidecar on every
//! mutation (append-then-flush; there is no partial update). The registry
//! also keeps the engine's structural map under a second sidecar key so
//! stores and indices can be rebuilt on re-initialization.

use crate::error::CoreResult;
use crate::schema::{StoreOptions, Trigger};
use mimicdb_storage::SidecarStore;
use mimicdb_engine::{SchemaPlan, StoreSchema};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Indices on surviving stores that must be dropped after a store removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexCleanup {
    /// Store carrying the stale indices.
    pub collection_name: String,
    /// Names of the indices to drop.
    pub index_names: Vec<String>,
}

/// Structural mutations accumulated since the last engine reopen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMutations {
    /// Stores to create or structurally refresh.
    #[serde(default)]
    pub update: Vec<String>,
    /// Stores to remove.
    #[serde(default)]
    pub remove: Vec<String>,
    /// Index cleanups on surviving stores.
    #[serde(default)]
    pub indices: Vec<IndexCleanup>,
}

/// The durable settings blob, serialized as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Structural version, bumped on every registry mutation.
    pub version: u32,
    /// Full export of store options.
    pub options: Vec<(String, StoreOptions)>,
    /// Serialized link graph: store → [(property, child store)].
    pub links: Vec<(String, Vec<(String, String)>)>,
    /// Pending structural mutations.
    pub mutations: PendingMutations,
    /// Serialized trigger set: (store, trigger).
    pub triggers: Vec<(String, Trigger)>,
}

/// The schema registry: options, link edges, and pending mutations.
pub struct SchemaRegistry {
    sidecar: Mutex<Box<dyn SidecarStore>>,
    settings_key: String,
    structure_key: String,
    version: u32,
    options: BTreeMap<String, StoreOptions>,
    links: BTreeMap<String, BTreeMap<String, String>>,
    pending: PendingMutations,
}

impl SchemaRegistry {
    /// Creates a registry over a sidecar, namespaced by database name.
    #[must_use]
    pub fn new(sidecar: Box<dyn SidecarStore>, database_name: &str) -> Self {
        Self {
            sidecar: Mutex::new(sidecar),
            settings_key: format!("{database_name}::settings"),
            structure_key: format!("{database_name}::structure"),
            version: 0,
            options: BTreeMap::new(),
            links: BTreeMap::new(),
            pending: PendingMutations::default(),
        }
    }

    /// Fully reloads settings from the sidecar. Missing keys leave the
    /// registry uninitialized.
    pub fn load(&mut self) -> CoreResult<()> {
        let raw = self.sidecar.lock().get(&self.settings_key)?;
        if let Some(raw) = raw {
            let settings: Settings = serde_json::from_str(&raw)?;
            self.version = settings.version;
            self.options = settings.options.into_iter().collect();
            self.links = settings
                .links
                .into_iter()
                .map(|(store, edges)| (store, edges.into_iter().collect()))
                .collect();
            self.pending = settings.mutations;
            tracing::debug!(
                version = self.version,
                stores = self.options.len(),
                "settings loaded"
            );
        }
        Ok(())
    }

    /// Serializes the whole registry state to the sidecar.
    fn flush(&mut self) -> CoreResult<()> {
        let settings = Settings {
            version: self.version,
            options: self
                .options
                .iter()
                .map(|(name, options)| (name.clone(), options.clone()))
                .collect(),
            links: self
                .links
                .iter()
                .map(|(store, edges)| {
                    (
                        store.clone(),
                        edges
                            .iter()
                            .map(|(property, child)| (property.clone(), child.clone()))
                            .collect(),
                    )
                })
                .collect(),
            mutations: self.pending.clone(),
            triggers: self
                .options
                .iter()
                .flat_map(|(name, options)| {
                    options
                        .triggers
                        .iter()
                        .map(|trigger| (name.clone(), trigger.clone()))
                })
                .collect(),
        };
        let raw = serde_json::to_string(&settings)?;
        self.sidecar.lock().set(&self.settings_key, &raw)?;
        Ok(())
    }

    /// Merges options into the registry, recursively through declared
    /// linked keys, recomputes the contributed link edges, marks the
    /// touched stores for structural update, and bumps the version.
    pub fn register_or_update(&mut self, options: &StoreOptions) -> CoreResult<()> {
        self.register_recursive(options);
        self.version += 1;
        self.flush()
    }

    fn register_recursive(&mut self, options: &StoreOptions) {
        let name = options.store_name.clone();

        match self.options.get_mut(&name) {
            Some(existing) => existing.merge_from(options),
            None => {
                self.options.insert(name.clone(), options.clone());
            }
        }

        let edges = self.links.entry(name.clone()).or_default();
        for (property, child) in &options.linked_keys {
            edges.insert(property.clone(), child.store_name.clone());
        }

        if !self.pending.update.contains(&name) {
            self.pending.update.push(name);
        }

        for child in options.linked_keys.values() {
            self.register_recursive(child);
        }
    }

    /// Removes stores: their options, the link edges pointing to or from
    /// them, and any linked-key declarations that referenced them. The
    /// given index cleanups are queued for the next structural plan.
    pub fn remove(&mut self, names: &[String], cleanups: Vec<IndexCleanup>) -> CoreResult<()> {
        for name in names {
            self.options.remove(name);
            self.links.remove(name);
            for edges in self.links.values_mut() {
                edges.retain(|_, child| child != name);
            }
            for options in self.options.values_mut() {
                strip_linked_references(options, name);
            }
            self.pending.update.retain(|pending| pending != name);
            if !self.pending.remove.contains(name) {
                self.pending.remove.push(name.clone());
            }
        }
        self.pending.indices.extend(cleanups);
        self.version += 1;
        self.flush()
    }

    /// Drains pending mutations into a structural plan for the engine.
    ///
    /// `schemas` carries inferred index definitions for stores touched by
    /// the current write; trigger indices from the registered options are
    /// appended to every created store.
    pub fn take_plan(&mut self, mut schemas: Vec<StoreSchema>) -> CoreResult<SchemaPlan> {
        for name in std::mem::take(&mut self.pending.update) {
            if !schemas.iter().any(|schema| schema.name == name) {
                schemas.push(StoreSchema::new(name, vec![]));
            }
        }
        for schema in &mut schemas {
            if let Some(options) = self.options.get(&schema.name) {
                for trigger in &options.triggers {
                    if let Some(def) = trigger.index_def() {
                        if !schema.indices.iter().any(|existing| existing.name == def.name) {
                            schema.indices.push(def);
                        }
                    }
                }
            }
        }

        let plan = SchemaPlan {
            version: self.version,
            create: schemas,
            remove: std::mem::take(&mut self.pending.remove),
            drop_indices: std::mem::take(&mut self.pending.indices)
                .into_iter()
                .map(|cleanup| (cleanup.collection_name, cleanup.index_names))
                .collect(),
        };
        self.flush()?;
        Ok(plan)
    }

    /// Returns the registered options for a store.
    #[must_use]
    pub fn options(&self, name: &str) -> Option<&StoreOptions> {
        self.options.get(name)
    }

    /// Returns the names of all registered stores.
    #[must_use]
    pub fn store_names(&self) -> Vec<String> {
        self.options.keys().cloned().collect()
    }

    /// Returns the current link edges: store → property → child store.
    #[must_use]
    pub fn links(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.links
    }

    /// Returns the declared trigger on a store, if any.
    #[must_use]
    pub fn trigger(&self, store: &str, name: &str) -> Option<&Trigger> {
        self.options
            .get(store)?
            .triggers
            .iter()
            .find(|trigger| trigger.name == name)
    }

    /// Returns the current structural version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Persists the engine's structural map under the second sidecar key.
    pub fn save_structure(&mut self, structure: &[StoreSchema]) -> CoreResult<()> {
        let raw = serde_json::to_string(structure)?;
        self.sidecar.lock().set(&self.structure_key, &raw)?;
        Ok(())
    }

    /// Loads the engine's structural map, if one was persisted.
    pub fn structure(&self) -> CoreResult<Vec<StoreSchema>> {
        match self.sidecar.lock().get(&self.structure_key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Wipes all durable and in-memory registry state.
    pub fn reset(&mut self) -> CoreResult<()> {
        {
            let mut sidecar = self.sidecar.lock();
            sidecar.remove(&self.settings_key)?;
            sidecar.remove(&self.structure_key)?;
        }
        self.version = 0;
        self.options.clear();
        self.links.clear();
        self.pending = PendingMutations::default();
        Ok(())
    }
}

/// Recursively drops linked-key declarations pointing at a removed store.
fn strip_linked_references(options: &mut StoreOptions, removed: &str) {
    options
        .linked_keys
        .retain(|_, child| child.store_name != removed);
    for child in options.linked_keys.values_mut() {
        strip_linked_references(child, removed);
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("version", &self.version)
            .field("stores", &self.options.len())
            .finish_non_exhaustive()
    }
}

//! The shared engine context.
//!
//! One context instance is owned by the [`crate::Database`] and shared by
//! the coordinators - there is no global registry state. Structural
//! mutations go through the registry lock; callers must not overlap them.

use crate::config::Config;
use crate::error::CoreResult;
use crate::generate::Generator;
use crate::schema::SchemaRegistry;
use mimicdb_engine::{StorageEngine, StoreSchema};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared state behind all coordinators.
pub(crate) struct EngineContext {
    /// The single process-wide engine handle.
    pub engine: Arc<dyn StorageEngine>,
    /// The settings registry (single-writer discipline).
    pub registry: Mutex<SchemaRegistry>,
    /// Per-store "last total results" counters.
    pub counters: RwLock<HashMap<String, usize>>,
    /// Generation collaborator for the `add` path.
    pub generator: Box<dyn Generator>,
    /// Engine configuration.
    pub config: Config,
}

impl EngineContext {
    /// Records the pre-pagination result total of a store query.
    pub fn set_result_count(&self, store: &str, total: usize) {
        self.counters.write().insert(store.to_string(), total);
    }

    /// Returns the last recorded result total for a store.
    pub fn result_count(&self, store: &str) -> Option<usize> {
        self.counters.read().get(store).copied()
    }

    /// Persists the engine's current structural map to the sidecar so the
    /// next initialization can rebuild stores and indices.
    pub async fn snapshot_structure(&self) -> CoreResult<()> {
        let mut structure = Vec::new();
        for store in self.engine.store_names().await {
            let indices = self.engine.index_defs(&store).await?;
            structure.push(StoreSchema::new(store, indices));
        }
        self.registry.lock().save_structure(&structure)
    }
}

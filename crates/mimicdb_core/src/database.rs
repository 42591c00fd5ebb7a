//! Database facade.

use crate::config::Config;
use crate::context::EngineContext;
use crate::delete::DeleteCoordinator;
use crate::error::{CoreError, CoreResult};
use crate::generate::{Generator, RandomGenerator, ValueTemplateMap};
use crate::read::ReadCoordinator;
use crate::schema::{CascadeType, RequestContext, SchemaRegistry, StoreOptions};
use crate::types::{CascadeReport, KeyQuery, PageQuery, SearchQuery, SortSpec, StoreReport};
use crate::write::WriteCoordinator;
use mimicdb_engine::{SchemaPlan, StorageEngine};
use mimicdb_storage::SidecarStore;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The main database handle.
///
/// `Database` owns the explicit engine context (engine handle, settings
/// registry, result counters) and exposes the persistence surface consumed
/// by a request-routing layer:
///
/// - [`persist`](Self::persist) / [`add`](Self::add) /
///   [`update`](Self::update) - writes with link decomposition
/// - [`read_by_key`](Self::read_by_key) / [`read_page`](Self::read_page) /
///   [`read_by_trigger`](Self::read_by_trigger) / [`search`](Self::search) /
///   [`filter`](Self::filter) - reads with link re-assembly
/// - [`delete_rows`](Self::delete_rows) / [`drop_stores`](Self::drop_stores)
///   / [`clear`](Self::clear) / [`drop_database`](Self::drop_database) -
///   deletes with cascade
///
/// # Opening a Database
///
/// ```rust,ignore
/// use mimicdb_core::{Database, StoreOptions};
/// use serde_json::json;
///
/// let db = Database::open_in_memory("fixtures").await?;
/// db.persist(
///     json!({"@id": "/api/locations/1", "name": "Test"}),
///     &StoreOptions::new("Location", "@id"),
/// )
/// .await?;
/// ```
///
/// Initialization fully reloads the durable settings and rebuilds the
/// engine structure from the persisted structural map. Structural
/// mutations (persist, drop) must not be issued concurrently; the
/// registry keeps a single-writer discipline.
pub struct Database {
    ctx: Arc<EngineContext>,
    write: WriteCoordinator,
    read: ReadCoordinator,
    delete: DeleteCoordinator,
}

impl Database {
    /// Opens a database over the given engine and sidecar with the
    /// default random generator.
    pub async fn open(
        config: Config,
        engine: Arc<dyn StorageEngine>,
        sidecar: Box<dyn SidecarStore>,
    ) -> CoreResult<Self> {
        Self::open_with(config, engine, sidecar, Box::new(RandomGenerator::new())).await
    }

    /// Opens a database with an explicit generation collaborator.
    pub async fn open_with(
        config: Config,
        engine: Arc<dyn StorageEngine>,
        sidecar: Box<dyn SidecarStore>,
        generator: Box<dyn Generator>,
    ) -> CoreResult<Self> {
        let mut registry = SchemaRegistry::new(sidecar, &config.database_name);
        registry.load()?;

        // Rebuild engine structure from the persisted structural map. The
        // engine may already be ahead (shared handle); never regress.
        let structure = registry.structure()?;
        let version = registry.version().max(engine.version().await);
        let plan = SchemaPlan {
            version,
            create: structure,
            remove: Vec::new(),
            drop_indices: Vec::new(),
        };
        engine.open(&plan).await?;
        tracing::debug!(name = %config.database_name, version, "database opened");

        let ctx = Arc::new(EngineContext {
            engine,
            registry: Mutex::new(registry),
            counters: RwLock::new(HashMap::new()),
            generator,
            config,
        });
        Ok(Self {
            write: WriteCoordinator::new(Arc::clone(&ctx)),
            read: ReadCoordinator::new(Arc::clone(&ctx)),
            delete: DeleteCoordinator::new(Arc::clone(&ctx)),
            ctx,
        })
    }

    /// Opens a fresh in-memory database for tests and ephemeral fixtures.
    pub async fn open_in_memory(name: &str) -> CoreResult<Self> {
        use mimicdb_engine::MemoryEngine;
        use mimicdb_storage::MemorySidecar;

        Self::open(
            Config::new().database_name(name),
            Arc::new(MemoryEngine::new()),
            Box::new(MemorySidecar::new()),
        )
        .await
    }

    /// Persists content (one entity or a same-shaped sequence) into its
    /// store and every linked store it embeds. Returns one report per
    /// touched store.
    pub async fn persist(
        &self,
        content: Value,
        options: &StoreOptions,
    ) -> CoreResult<Vec<StoreReport>> {
        self.write.persist(content, options).await
    }

    /// Adds content to an already-registered store, generating absent
    /// fields from the optional template, and returns the cleaned rows as
    /// stored (POST/PUT semantics).
    pub async fn add(
        &self,
        store: &str,
        content: Value,
        template: Option<&ValueTemplateMap>,
    ) -> CoreResult<Value> {
        self.write.add(store, content, template).await
    }

    /// Updates rows whose identity already exists in the store.
    pub async fn update(&self, store: &str, content: Value) -> CoreResult<Value> {
        self.write.update(store, content).await
    }

    /// Looks up entities by primary key (or a named index), re-attaching
    /// linked sub-entities. A single-key query yields a single entity;
    /// multi-key queries yield an array with missing keys skipped.
    pub async fn read_by_key(&self, store: &str, query: &KeyQuery) -> CoreResult<Value> {
        let single = query.primary_keys.len() == 1;
        let mut rows = self.read.read_by_key(store, query).await?;
        if single {
            rows.pop().ok_or_else(|| {
                CoreError::entity_not_found(store, query.primary_keys[0].clone())
            })
        } else {
            Ok(Value::Array(rows))
        }
    }

    /// Full-store scan with sort and pagination.
    pub async fn read_page(
        &self,
        store: &str,
        page: &PageQuery,
        sort: Option<&SortSpec>,
    ) -> CoreResult<Vec<Value>> {
        self.read.read_page(store, page, sort).await
    }

    /// Resolves a named trigger against a request context.
    pub async fn read_by_trigger(
        &self,
        store: &str,
        trigger: &str,
        request: &RequestContext,
        sort: Option<&SortSpec>,
        page: Option<&PageQuery>,
    ) -> CoreResult<Vec<Value>> {
        self.read
            .read_by_trigger(store, trigger, request, sort, page)
            .await
    }

    /// Case-insensitive substring search over one indexed dot path.
    pub async fn search(
        &self,
        store: &str,
        query: &SearchQuery,
        page: Option<&PageQuery>,
        sort: Option<&SortSpec>,
    ) -> CoreResult<Vec<Value>> {
        self.read.search(store, query, page, sort).await
    }

    /// Free-form predicate filter over already-sorted, cleaned content.
    pub async fn filter<F>(
        &self,
        store: &str,
        predicate: F,
        page: Option<&PageQuery>,
        sort: Option<&SortSpec>,
    ) -> CoreResult<Vec<Value>>
    where
        F: Fn(&Value) -> bool,
    {
        self.read.filter(store, &predicate, page, sort).await
    }

    /// Deletes rows by key and cascades into embedding ancestors.
    pub async fn delete_rows(
        &self,
        store: &str,
        keys: &[String],
    ) -> CoreResult<Vec<CascadeReport>> {
        self.delete.delete_rows(store, keys).await
    }

    /// Drops whole stores with the given cascade policy.
    pub async fn drop_stores(
        &self,
        names: &[String],
        cascade: CascadeType,
    ) -> CoreResult<Vec<CascadeReport>> {
        self.delete.drop_stores(names, cascade).await
    }

    /// Empties a store, returning `false` when it does not exist.
    pub async fn clear(&self, store: &str) -> CoreResult<bool> {
        self.delete.clear(store).await
    }

    /// Wipes the engine and all durable settings.
    pub async fn drop_database(&self) -> CoreResult<()> {
        self.ctx.engine.delete_database().await?;
        self.ctx.registry.lock().reset()?;
        self.ctx.counters.write().clear();
        tracing::debug!("database dropped");
        Ok(())
    }

    /// The total result count of the last scan/trigger/search/filter on a
    /// store, without refetching.
    #[must_use]
    pub fn result_count(&self, store: &str) -> Option<usize> {
        self.ctx.result_count(store)
    }

    /// Closes the engine handle. Durable state survives for the next open.
    pub async fn close(&self) {
        self.ctx.engine.close().await;
    }

    /// Returns the database configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.ctx.config
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.ctx.config.database_name)
            .finish_non_exhaustive()
    }
}

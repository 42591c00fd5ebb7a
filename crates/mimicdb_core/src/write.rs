//! The write coordinator.
//!
//! `persist` drives the full write pipeline: register options, decompose
//! the nested content into per-store queues, infer indices from a sample,
//! apply the structural plan, re-link ancestors that embed rewritten
//! entities, and commit everything as one multi-store batch.

use crate::context::EngineContext;
use crate::error::{CoreError, CoreResult};
use crate::generate::{fill_defaults, ValueTemplateMap};
use crate::links::LinkGraph;
use crate::schema::StoreOptions;
use crate::types::StoreReport;
use mimicdb_engine::{EngineError, IndexDef, StoreSchema, WriteBatch};
use mimicdb_value::{derive_identity, resolve_path, set_at_path, strip_tags, tag_entity, PKEY, STORE_TAG};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// An ordered multi-store row queue, deduplicated by primary key.
///
/// Stores appear in first-encounter order; rows keep their first-queued
/// version unless a later step mutates them in place via
/// [`RowQueue::get_mut`].
#[derive(Debug, Default)]
pub(crate) struct RowQueue {
    order: Vec<String>,
    stores: HashMap<String, StoreRows>,
}

#[derive(Debug, Default)]
struct StoreRows {
    rows: Vec<Value>,
    by_pkey: HashMap<String, usize>,
}

impl RowQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Ensures a store participates in the write, even with no rows.
    pub(crate) fn touch(&mut self, store: &str) {
        if !self.stores.contains_key(store) {
            self.order.push(store.to_string());
            self.stores.insert(store.to_string(), StoreRows::default());
        }
    }

    /// Queues a row unless its key is already queued for the store.
    pub(crate) fn enqueue(&mut self, store: &str, pkey: &str, row: Value) {
        self.touch(store);
        let entry = self.stores.get_mut(store).expect("touched above");
        if entry.by_pkey.contains_key(pkey) {
            return;
        }
        entry.by_pkey.insert(pkey.to_string(), entry.rows.len());
        entry.rows.push(row);
    }

    /// Mutable access to an already-queued row.
    pub(crate) fn get_mut(&mut self, store: &str, pkey: &str) -> Option<&mut Value> {
        let entry = self.stores.get_mut(store)?;
        let index = *entry.by_pkey.get(pkey)?;
        entry.rows.get_mut(index)
    }

    pub(crate) fn order(&self) -> &[String] {
        &self.order
    }

    pub(crate) fn rows(&self, store: &str) -> &[Value] {
        self.stores
            .get(store)
            .map(|entry| entry.rows.as_slice())
            .unwrap_or_default()
    }
}

/// The write coordinator.
pub(crate) struct WriteCoordinator {
    ctx: Arc<EngineContext>,
}

impl WriteCoordinator {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Persists content into its store and every linked store it embeds.
    pub async fn persist(
        &self,
        content: Value,
        options: &StoreOptions,
    ) -> CoreResult<Vec<StoreReport>> {
        let rows = into_rows(content)?;
        tracing::debug!(store = %options.store_name, rows = rows.len(), "persist");

        // Registry first, before any engine I/O.
        self.ctx.registry.lock().register_or_update(options)?;
        let merged = self
            .ctx
            .registry
            .lock()
            .options(&options.store_name)
            .cloned()
            .ok_or_else(|| CoreError::store_not_registered(&options.store_name))?;

        let mut queue = RowQueue::new();
        decompose(&mut queue, &merged, rows)?;

        // Index inference from a bounded sample of each queue.
        let sample_size = self.ctx.config.index_sample_size;
        let schemas = {
            let registry = self.ctx.registry.lock();
            queue
                .order()
                .iter()
                .map(|store| {
                    let indices = registry
                        .options(store)
                        .map(|opts| infer_indices(queue.rows(store), opts, sample_size))
                        .unwrap_or_default();
                    StoreSchema::new(store.clone(), indices)
                })
                .collect()
        };

        // One structural reopen at the bumped version.
        let plan = self.ctx.registry.lock().take_plan(schemas)?;
        self.ctx.engine.open(&plan).await?;

        self.relink_ancestors(&mut queue).await?;
        self.ctx.snapshot_structure().await?;

        // Commit the whole queue in first-encounter order.
        let mut batch = WriteBatch::new();
        {
            let registry = self.ctx.registry.lock();
            for store in queue.order() {
                let retain = registry.options(store).is_none_or(|opts| opts.persist);
                let rows = if retain {
                    queue.rows(store).to_vec()
                } else {
                    Vec::new()
                };
                batch.push(store, rows);
            }
        }
        let summaries = self.ctx.engine.execute(batch).await?;

        let mut reports = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let index_names = self.ctx.engine.index_names(&summary.store).await?;
            reports.push(StoreReport {
                store_name: summary.store,
                rows_written: summary.rows_written,
                index_names,
            });
        }
        Ok(reports)
    }

    /// Adds content to a registered store with POST/PUT semantics:
    /// absent fields are generated from the template, the rows are
    /// persisted, then read back cleaned.
    pub async fn add(
        &self,
        store: &str,
        content: Value,
        template: Option<&ValueTemplateMap>,
    ) -> CoreResult<Value> {
        let options = self.registered_options(store)?;
        let single = content.is_object();
        let mut rows = into_rows(content)?;
        if let Some(templates) = template {
            for row in &mut rows {
                fill_defaults(row, templates, self.ctx.generator.as_ref());
            }
        }
        self.write_back(store, &options, rows, single).await
    }

    /// Updates existing rows; the derived identity must already be stored.
    pub async fn update(&self, store: &str, content: Value) -> CoreResult<Value> {
        let options = self.registered_options(store)?;
        let single = content.is_object();
        let rows = into_rows(content)?;
        for row in &rows {
            let pkey = derive_row_identity(row, &options)?;
            if self.ctx.engine.get(store, &pkey).await?.is_none() {
                return Err(CoreError::entity_not_found(store, pkey));
            }
        }
        self.write_back(store, &options, rows, single).await
    }

    fn registered_options(&self, store: &str) -> CoreResult<StoreOptions> {
        self.ctx
            .registry
            .lock()
            .options(store)
            .cloned()
            .ok_or_else(|| CoreError::store_not_registered(store))
    }

    async fn write_back(
        &self,
        store: &str,
        options: &StoreOptions,
        rows: Vec<Value>,
        single: bool,
    ) -> CoreResult<Value> {
        let mut pkeys = Vec::with_capacity(rows.len());
        for row in &rows {
            pkeys.push(derive_row_identity(row, options)?);
        }
        self.persist(Value::Array(rows), options).await?;

        let mut out = Vec::with_capacity(pkeys.len());
        for pkey in &pkeys {
            let mut row = self
                .ctx
                .engine
                .get(store, pkey)
                .await?
                .ok_or_else(|| CoreError::entity_not_found(store, pkey.clone()))?;
            strip_tags(&mut row);
            out.push(row);
        }
        if single {
            out.into_iter()
                .next()
                .ok_or_else(|| CoreError::invalid_content("empty content"))
        } else {
            Ok(Value::Array(out))
        }
    }

    /// Splices freshly queued rows into every stored ancestor row that
    /// embeds them, re-queueing the mutated ancestors. Transitive
    /// ancestors are reached directly through their accumulated paths, so
    /// one pass over the decomposed queue applies the whole chain before
    /// anything commits.
    async fn relink_ancestors(&self, queue: &mut RowQueue) -> CoreResult<()> {
        let graph = LinkGraph::new(self.ctx.registry.lock().links());

        let snapshot: Vec<(String, Vec<(String, Value)>)> = queue
            .order()
            .iter()
            .map(|store| {
                let rows = queue
                    .rows(store)
                    .iter()
                    .filter_map(|row| {
                        row.get(PKEY)
                            .and_then(Value::as_str)
                            .map(|pkey| (pkey.to_string(), row.clone()))
                    })
                    .collect();
                (store.clone(), rows)
            })
            .collect();

        for (store, rows) in snapshot {
            let ancestors = graph.ancestors_of(&store)?;
            if ancestors.is_empty() {
                continue;
            }
            for (pkey, row) in rows {
                for ancestor in &ancestors {
                    let mut fresh = row.clone();
                    tag_entity(&mut fresh, &pkey, &store);
                    // __store__ is an embedding tag only; the queued row
                    // itself carries just __pkey__.
                    let embedded_path = format!("{}.{}", ancestor.path, PKEY);

                    let ancestor_rows = self
                        .fetch_embedding_rows(&ancestor.store, &embedded_path, &ancestor.path, &pkey)
                        .await?;
                    for ancestor_row in ancestor_rows {
                        let Some(ancestor_pkey) =
                            ancestor_row.get(PKEY).and_then(Value::as_str).map(str::to_string)
                        else {
                            continue;
                        };
                        match queue.get_mut(&ancestor.store, &ancestor_pkey) {
                            Some(queued) => {
                                if embedded_pkey(queued, &ancestor.path) == Some(pkey.clone()) {
                                    set_at_path(queued, &ancestor.path, fresh.clone());
                                }
                            }
                            None => {
                                let mut copy = ancestor_row.clone();
                                set_at_path(&mut copy, &ancestor.path, fresh.clone());
                                queue.enqueue(&ancestor.store, &ancestor_pkey, copy);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Rows of `store` whose embedded entity at `path` has the given key,
    /// preferring the store's own index and falling back to a scan when
    /// the index does not exist yet. A store absent from the engine has no
    /// rows to re-link.
    async fn fetch_embedding_rows(
        &self,
        store: &str,
        index_name: &str,
        path: &str,
        pkey: &str,
    ) -> CoreResult<Vec<Value>> {
        let has_index = match self.ctx.engine.has_index(store, index_name).await {
            Ok(found) => found,
            Err(EngineError::StoreNotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if has_index {
            return Ok(self
                .ctx
                .engine
                .get_by_index(store, index_name, &[pkey.to_string()])
                .await?);
        }
        match self.ctx.engine.get_all(store).await {
            Ok(rows) => Ok(rows
                .into_iter()
                .filter(|row| embedded_pkey(row, path).as_deref() == Some(pkey))
                .collect()),
            Err(EngineError::StoreNotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The identity of the entity embedded at `path`, if one is there.
fn embedded_pkey(row: &Value, path: &str) -> Option<String> {
    resolve_path(row, path)?
        .get(PKEY)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Normalizes content into a row vector: one object, or an array of
/// objects.
pub(crate) fn into_rows(content: Value) -> CoreResult<Vec<Value>> {
    match content {
        Value::Object(_) => Ok(vec![content]),
        Value::Array(items) => {
            if let Some(bad) = items.iter().find(|item| !item.is_object()) {
                return Err(CoreError::invalid_content(format!(
                    "array element is not an object: {bad}"
                )));
            }
            Ok(items)
        }
        other => Err(CoreError::invalid_content(format!(
            "content must be an object or array of objects, got {other}"
        ))),
    }
}

/// Derives the row identity from the declared primary-key property.
pub(crate) fn derive_row_identity(row: &Value, options: &StoreOptions) -> CoreResult<String> {
    row.get(&options.primary_key)
        .and_then(derive_identity)
        .ok_or_else(|| {
            CoreError::primary_key_missing(&options.store_name, &options.primary_key)
        })
}

/// Recursively decomposes rows along declared linked keys into the queue.
fn decompose(queue: &mut RowQueue, options: &StoreOptions, rows: Vec<Value>) -> CoreResult<()> {
    queue.touch(&options.store_name);
    for mut row in rows {
        let pkey = derive_row_identity(&row, options)?;
        decompose_links(queue, options, &mut row)?;
        if let Some(map) = row.as_object_mut() {
            map.insert(PKEY.to_string(), Value::String(pkey.clone()));
        }
        queue.enqueue(&options.store_name, &pkey, row);
    }
    Ok(())
}

fn decompose_links(
    queue: &mut RowQueue,
    options: &StoreOptions,
    row: &mut Value,
) -> CoreResult<()> {
    for (property, child_options) in &options.linked_keys {
        let Some(value) = row.get_mut(property) else {
            continue;
        };
        match value {
            Value::Object(_) if matches_link_shape(value, child_options) => {
                extract_linked(queue, child_options, value)?;
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if matches_link_shape(item, child_options) {
                        extract_linked(queue, child_options, item)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Extracts one embedded linked value: its own links first (depth-first,
/// so the extracted row carries tagged grandchildren), then a copy into
/// the child queue and the `__pkey__`/`__store__` tags onto the embedded
/// copy left in the parent.
fn extract_linked(
    queue: &mut RowQueue,
    child_options: &StoreOptions,
    value: &mut Value,
) -> CoreResult<()> {
    decompose_links(queue, child_options, value)?;
    let pkey = derive_row_identity(value, child_options)?;

    let mut child_row = value.clone();
    if let Some(map) = child_row.as_object_mut() {
        map.insert(PKEY.to_string(), Value::String(pkey.clone()));
    }
    queue.enqueue(&child_options.store_name, &pkey, child_row);

    tag_entity(value, &pkey, &child_options.store_name);
    Ok(())
}

/// An embedded value matches a linked store's shape when it carries the
/// store's primary-key property.
fn matches_link_shape(value: &Value, child: &StoreOptions) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(&child.primary_key))
}

/// Infers the index set of a store from a sample of its queued rows.
///
/// Plain scalar properties and nested object properties index by their dot
/// path, recursively through embedded linked entities (whose `__pkey__`
/// joins the set as a compound path). Booleans and arrays are never
/// indexed; the top-level `__pkey__` is the key path itself and stays out
/// of the general set.
fn infer_indices(rows: &[Value], options: &StoreOptions, sample_size: usize) -> Vec<IndexDef> {
    let mut paths = BTreeSet::new();
    for row in rows.iter().take(sample_size) {
        collect_index_paths(row, "", &mut paths);
    }
    paths
        .into_iter()
        .map(|path| {
            let unique = options.unique_keys.contains(&path);
            IndexDef::single(path, unique)
        })
        .collect()
}

fn collect_index_paths(value: &Value, prefix: &str, out: &mut BTreeSet<String>) {
    let Some(map) = value.as_object() else {
        return;
    };
    for (property, member) in map {
        if property == STORE_TAG {
            continue;
        }
        if property == PKEY {
            if !prefix.is_empty() {
                out.insert(format!("{prefix}{PKEY}"));
            }
            continue;
        }
        match member {
            Value::String(_) | Value::Number(_) => {
                out.insert(format!("{prefix}{property}"));
            }
            Value::Object(_) => {
                collect_index_paths(member, &format!("{prefix}{property}."), out);
            }
            _ => {}
        }
    }
}

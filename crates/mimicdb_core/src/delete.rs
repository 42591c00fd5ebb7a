//! The delete coordinator.
//!
//! Row deletes and store drops both walk the ancestor chain nearest-first,
//! applying the cascade policy to a copy of every row that embeds a pruned
//! entity. Mutated ancestor rows compose across rounds in one queue and
//! commit as a single final batch, mirroring the write coordinator's
//! re-linking in reverse.

use crate::context::EngineContext;
use crate::error::{CoreError, CoreResult};
use crate::links::LinkGraph;
use crate::schema::{CascadeType, IndexCleanup};
use crate::types::CascadeReport;
use crate::write::RowQueue;
use mimicdb_engine::{EngineError, WriteBatch};
use mimicdb_value::{remove_at_path, resolve_path, resolve_path_mut, set_at_path, PKEY};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The delete coordinator.
pub(crate) struct DeleteCoordinator {
    ctx: Arc<EngineContext>,
}

impl DeleteCoordinator {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Deletes rows by key, then cascades into every ancestor embedding
    /// one of the deleted entities, using each ancestor's declared policy.
    pub async fn delete_rows(
        &self,
        store: &str,
        keys: &[String],
    ) -> CoreResult<Vec<CascadeReport>> {
        let primary_key = self.primary_key_of(store)?;
        tracing::debug!(store, keys = keys.len(), "delete rows");

        let mut deleted = Vec::with_capacity(keys.len());
        for key in keys {
            if self.ctx.engine.delete(store, key).await? {
                deleted.push(key.clone());
            }
        }

        let mut reports = vec![CascadeReport {
            store_name: store.to_string(),
            primary_keys: deleted.clone(),
            path: primary_key,
            cascade: CascadeType::Delete,
        }];
        reports.extend(self.cascade_ancestors(store, Some(&deleted), None).await?);
        Ok(reports)
    }

    /// Drops whole stores. The passed cascade policy is applied to every
    /// ancestor row embedding anything from the dropped stores; `Keep`
    /// skips ancestor scanning entirely. The registry is updated after
    /// pruning, and the engine applies the structural removal plus the
    /// index cleanups recorded for surviving stores.
    pub async fn drop_stores(
        &self,
        names: &[String],
        cascade: CascadeType,
    ) -> CoreResult<Vec<CascadeReport>> {
        let mut reports = Vec::new();
        for name in names {
            let primary_key = self.primary_key_of(name)?;
            tracing::debug!(store = %name, ?cascade, "drop store");

            let all_keys = match self.ctx.engine.get_all(name).await {
                Ok(rows) => rows
                    .iter()
                    .filter_map(|row| row.get(PKEY).and_then(Value::as_str))
                    .map(str::to_string)
                    .collect(),
                Err(EngineError::StoreNotFound { .. }) => Vec::new(),
                Err(e) => return Err(e.into()),
            };

            if cascade != CascadeType::Keep {
                reports.extend(self.cascade_ancestors(name, None, Some(cascade)).await?);
            }
            reports.push(CascadeReport {
                store_name: name.clone(),
                primary_keys: all_keys,
                path: primary_key,
                cascade,
            });
        }

        let cleanups = self.index_cleanups(names).await?;
        let plan = {
            let mut registry = self.ctx.registry.lock();
            registry.remove(names, cleanups)?;
            registry.take_plan(Vec::new())?
        };
        self.ctx.engine.open(&plan).await?;
        self.ctx.snapshot_structure().await?;
        Ok(reports)
    }

    /// Empties a store without structural change.
    pub async fn clear(&self, store: &str) -> CoreResult<bool> {
        match self.ctx.engine.clear(store).await {
            Ok(()) => Ok(true),
            Err(EngineError::StoreNotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn primary_key_of(&self, store: &str) -> CoreResult<String> {
        self.ctx
            .registry
            .lock()
            .options(store)
            .map(|options| options.primary_key.clone())
            .ok_or_else(|| CoreError::store_not_registered(store))
    }

    /// Walks the ancestors of `target` nearest-first, mutating copies of
    /// every row whose embedded entity at the accumulated path matches a
    /// pruned key (`keys = None` means "anything from the target store").
    /// Mutations of the same row across rounds compose in the queue; one
    /// batch commits everything at the end.
    async fn cascade_ancestors(
        &self,
        target: &str,
        keys: Option<&[String]>,
        cascade_override: Option<CascadeType>,
    ) -> CoreResult<Vec<CascadeReport>> {
        let graph = LinkGraph::new(self.ctx.registry.lock().links());
        let ancestors = graph.ancestors_of(target)?;
        if ancestors.is_empty() {
            return Ok(Vec::new());
        }

        let mut queue = RowQueue::new();
        let mut reports = Vec::new();

        for ancestor in &ancestors {
            let cascade = match cascade_override {
                Some(cascade) => cascade,
                None => self
                    .ctx
                    .registry
                    .lock()
                    .options(&ancestor.store)
                    .map(|options| options.cascade)
                    .unwrap_or_default(),
            };
            if cascade == CascadeType::Keep {
                continue;
            }

            let rows = match self.ctx.engine.get_all(&ancestor.store).await {
                Ok(rows) => rows,
                Err(EngineError::StoreNotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            };

            let mut affected = Vec::new();
            for row in rows {
                let Some(row_pkey) = row.get(PKEY).and_then(Value::as_str).map(str::to_string)
                else {
                    continue;
                };
                // Copy-then-mutate, composing with any earlier mutation of
                // the same row from a previous round.
                let mut working = match queue.get_mut(&ancestor.store, &row_pkey) {
                    Some(queued) => queued.clone(),
                    None => row.clone(),
                };
                if apply_cascade(&mut working, &ancestor.path, keys, cascade) {
                    affected.push(row_pkey.clone());
                    match queue.get_mut(&ancestor.store, &row_pkey) {
                        Some(queued) => *queued = working,
                        None => queue.enqueue(&ancestor.store, &row_pkey, working),
                    }
                }
            }
            if !affected.is_empty() {
                reports.push(CascadeReport {
                    store_name: ancestor.store.clone(),
                    primary_keys: affected,
                    path: ancestor.path.clone(),
                    cascade,
                });
            }
        }

        let mut batch = WriteBatch::new();
        for store in queue.order() {
            batch.push(store, queue.rows(store).to_vec());
        }
        if !batch.is_empty() {
            self.ctx.engine.execute(batch).await?;
        }
        Ok(reports)
    }

    /// Indices on surviving stores whose dot paths traverse the embedding
    /// path of a dropped store.
    async fn index_cleanups(&self, names: &[String]) -> CoreResult<Vec<IndexCleanup>> {
        let graph = LinkGraph::new(self.ctx.registry.lock().links());
        let mut stale: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for name in names {
            for ancestor in graph.ancestors_of(name)? {
                if names.contains(&ancestor.store) {
                    continue;
                }
                let defs = match self.ctx.engine.index_defs(&ancestor.store).await {
                    Ok(defs) => defs,
                    Err(EngineError::StoreNotFound { .. }) => continue,
                    Err(e) => return Err(e.into()),
                };
                let prefix = format!("{}.", ancestor.path);
                for def in defs {
                    let traverses = def
                        .key_paths
                        .iter()
                        .any(|path| path == &ancestor.path || path.starts_with(&prefix));
                    if traverses {
                        stale
                            .entry(ancestor.store.clone())
                            .or_default()
                            .insert(def.name);
                    }
                }
            }
        }

        Ok(stale
            .into_iter()
            .map(|(collection_name, index_names)| IndexCleanup {
                collection_name,
                index_names: index_names.into_iter().collect(),
            })
            .collect())
    }
}

/// Applies a cascade policy to the embedded value at `path` when its
/// identity matches (`keys = None` matches any embedded entity). Returns
/// `true` if the row was mutated. Terminal arrays are handled
/// element-wise.
fn apply_cascade(
    row: &mut Value,
    path: &str,
    keys: Option<&[String]>,
    cascade: CascadeType,
) -> bool {
    let key_matches = |value: &Value| -> bool {
        value
            .get(PKEY)
            .and_then(Value::as_str)
            .is_some_and(|pkey| keys.is_none_or(|keys| keys.iter().any(|k| k == pkey)))
    };

    let embedded_is_array = matches!(resolve_path(row, path), Some(Value::Array(_)));
    if embedded_is_array {
        let Some(Value::Array(items)) = resolve_path_mut(row, path) else {
            return false;
        };
        if !items.iter().any(|item| key_matches(item)) {
            return false;
        }
        match cascade {
            CascadeType::Delete => items.retain(|item| !key_matches(item)),
            CascadeType::Null | CascadeType::Undefined => {
                for item in items.iter_mut() {
                    if key_matches(item) {
                        *item = Value::Null;
                    }
                }
            }
            CascadeType::Keep => return false,
        }
        return true;
    }

    if !resolve_path(row, path).is_some_and(key_matches) {
        return false;
    }
    match cascade {
        CascadeType::Delete => {
            remove_at_path(row, path);
        }
        CascadeType::Null | CascadeType::Undefined => {
            set_at_path(row, path, Value::Null);
        }
        CascadeType::Keep => return false,
    }
    true
}

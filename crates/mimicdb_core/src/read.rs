//! The read coordinator.
//!
//! Key lookups re-attach linked sub-entities recursively; scans, trigger
//! lookups, search and filter share the sort/paginate/strip pipeline and
//! feed the per-store result counters.

use crate::context::EngineContext;
use crate::error::{CoreError, CoreResult};
use crate::links::LinkGraph;
use crate::schema::{RequestContext, Trigger, TriggerRule};
use crate::types::{KeyQuery, PageQuery, SearchQuery, SortSpec};
use mimicdb_engine::EngineError;
use mimicdb_value::{
    compare_values, is_tagged_entity, resolve_path, scalar_to_key, strip_tags, tag_entity, PKEY,
    STORE_TAG,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::ops::Bound;
use std::pin::Pin;
use std::sync::Arc;

type AttachFuture<'a> = Pin<Box<dyn Future<Output = CoreResult<()>> + Send + 'a>>;

/// The read coordinator.
pub(crate) struct ReadCoordinator {
    ctx: Arc<EngineContext>,
}

impl ReadCoordinator {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// One entity per requested key, linked sub-entities re-attached and
    /// tags stripped. Missing keys are silently skipped.
    pub async fn read_by_key(&self, store: &str, query: &KeyQuery) -> CoreResult<Vec<Value>> {
        self.ensure_registered(store)?;
        let mut out = Vec::with_capacity(query.primary_keys.len());
        for key in &query.primary_keys {
            let row = match &query.index {
                Some(index) => self
                    .ctx
                    .engine
                    .get_by_index(store, index, &[key.clone()])
                    .await?
                    .into_iter()
                    .next(),
                None => self.ctx.engine.get(store, key).await?,
            };
            if let Some(mut row) = row {
                let mut chain = vec![store.to_string()];
                self.attach_children(store, &mut row, &mut chain).await?;
                strip_tags(&mut row);
                out.push(row);
            }
        }
        Ok(out)
    }

    /// Full-store scan with sort and pagination.
    pub async fn read_page(
        &self,
        store: &str,
        page: &PageQuery,
        sort: Option<&SortSpec>,
    ) -> CoreResult<Vec<Value>> {
        self.ensure_registered(store)?;
        let mut rows = self.ctx.engine.get_all(store).await?;
        for row in &mut rows {
            strip_tags(row);
        }
        sort_rows(&mut rows, sort);
        self.ctx.set_result_count(store, rows.len());
        Ok(paginate(rows, &self.effective_page(page)))
    }

    /// Resolves a named trigger against a request context: a bounded range
    /// query per resolved compound key, substring filtering for rules
    /// marked search, then sort and pagination.
    pub async fn read_by_trigger(
        &self,
        store: &str,
        trigger_name: &str,
        request: &RequestContext,
        sort: Option<&SortSpec>,
        page: Option<&PageQuery>,
    ) -> CoreResult<Vec<Value>> {
        self.ensure_registered(store)?;
        let trigger: Trigger = self
            .ctx
            .registry
            .lock()
            .trigger(store, trigger_name)
            .cloned()
            .ok_or_else(|| CoreError::trigger_not_found(store, trigger_name))?;

        let key_rules: Vec<TriggerRule> = trigger.key_rules().cloned().collect();
        let mut rows = if key_rules.is_empty() {
            self.ctx.engine.get_all(store).await?
        } else {
            self.rows_for_keys(store, &trigger, &key_rules, request).await?
        };

        for rule in trigger.search_rules() {
            let terms: Vec<String> = rule
                .resolve(request)
                .into_iter()
                .map(|term| term.to_lowercase())
                .collect();
            if terms.is_empty() {
                continue;
            }
            rows.retain(|row| {
                terms
                    .iter()
                    .any(|term| matches_at_path(row, &rule.path, term))
            });
        }

        for row in &mut rows {
            strip_tags(row);
        }
        sort_rows(&mut rows, sort);
        self.ctx.set_result_count(store, rows.len());
        Ok(match page {
            Some(page) => paginate(rows, &self.effective_page(page)),
            None => rows,
        })
    }

    /// Case-insensitive substring search over one dot path, walking nested
    /// properties and arrays element-wise.
    pub async fn search(
        &self,
        store: &str,
        query: &SearchQuery,
        page: Option<&PageQuery>,
        sort: Option<&SortSpec>,
    ) -> CoreResult<Vec<Value>> {
        self.ensure_registered(store)?;
        let term = query.term.to_lowercase();
        let mut rows = self.ctx.engine.get_all(store).await?;
        rows.retain(|row| matches_at_path(row, &query.index, &term));
        for row in &mut rows {
            strip_tags(row);
        }
        sort_rows(&mut rows, sort);
        self.ctx.set_result_count(store, rows.len());
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(match page {
            Some(page) => paginate(rows, &self.effective_page(page)),
            None => rows,
        })
    }

    /// Caller-supplied predicate over already-fetched, already-sorted,
    /// already-cleaned content.
    pub async fn filter(
        &self,
        store: &str,
        predicate: &dyn Fn(&Value) -> bool,
        page: Option<&PageQuery>,
        sort: Option<&SortSpec>,
    ) -> CoreResult<Vec<Value>> {
        self.ensure_registered(store)?;
        let mut rows = self.ctx.engine.get_all(store).await?;
        for row in &mut rows {
            strip_tags(row);
        }
        sort_rows(&mut rows, sort);
        rows.retain(|row| predicate(row));
        self.ctx.set_result_count(store, rows.len());
        Ok(match page {
            Some(page) => paginate(rows, &self.effective_page(page)),
            None => rows,
        })
    }

    /// Fills in the configured page size when a query carries none.
    fn effective_page(&self, page: &PageQuery) -> PageQuery {
        if page.pagination && page.page_size == 0 {
            PageQuery {
                page_size: self.ctx.config.default_page_size,
                ..*page
            }
        } else {
            *page
        }
    }

    fn ensure_registered(&self, store: &str) -> CoreResult<()> {
        if self.ctx.registry.lock().options(store).is_none() {
            return Err(CoreError::store_not_registered(store));
        }
        Ok(())
    }

    fn linked_children(&self, store: &str) -> BTreeMap<String, String> {
        let registry = self.ctx.registry.lock();
        LinkGraph::new(registry.links()).descendants_of(store)
    }

    /// Rows matching the trigger's resolved compound keys. Multi-valued
    /// parameters produce one bounded range query per key combination,
    /// chained sequentially and merged in first-seen order.
    async fn rows_for_keys(
        &self,
        store: &str,
        trigger: &Trigger,
        key_rules: &[TriggerRule],
        request: &RequestContext,
    ) -> CoreResult<Vec<Value>> {
        let mut per_rule: Vec<Vec<String>> = Vec::with_capacity(key_rules.len());
        for rule in key_rules {
            let values = rule.resolve(request);
            if values.is_empty() {
                // An unresolvable key component matches nothing.
                return Ok(Vec::new());
            }
            per_rule.push(values);
        }

        let combos = cartesian(&per_rule);
        let use_index = matches!(
            self.ctx.engine.has_index(store, &trigger.name).await,
            Ok(true)
        );

        let mut rows = Vec::new();
        let mut seen = BTreeSet::new();
        for combo in combos {
            let hits = if use_index {
                self.ctx
                    .engine
                    .range(
                        store,
                        &trigger.name,
                        Bound::Included(combo.clone()),
                        Bound::Included(combo.clone()),
                    )
                    .await?
            } else {
                // Index not built yet: scan and compare at the rule paths.
                self.ctx
                    .engine
                    .get_all(store)
                    .await?
                    .into_iter()
                    .filter(|row| {
                        key_rules.iter().zip(combo.iter()).all(|(rule, component)| {
                            resolve_path(row, &rule.path)
                                .and_then(scalar_to_key)
                                .as_deref()
                                == Some(component.as_str())
                        })
                    })
                    .collect()
            };
            for hit in hits {
                let pkey = hit
                    .get(PKEY)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if seen.insert(pkey) {
                    rows.push(hit);
                }
            }
        }
        Ok(rows)
    }

    /// Walks the row's linked properties, replacing each embedded tagged
    /// fragment with the freshly stored child (recursively re-attached
    /// itself). The chain guard keeps accidental link cycles from looping.
    fn attach_children<'a>(
        &'a self,
        store: &'a str,
        row: &'a mut Value,
        chain: &'a mut Vec<String>,
    ) -> AttachFuture<'a> {
        Box::pin(async move {
            let children = self.linked_children(store);
            for (property, child_store) in children {
                if chain.iter().any(|visited| visited == &child_store) {
                    continue;
                }
                let Some(value) = row.get_mut(&property) else {
                    continue;
                };
                if is_tagged_entity(value) {
                    self.attach_one(&child_store, value, chain).await?;
                } else if let Value::Array(items) = value {
                    for item in items.iter_mut() {
                        if is_tagged_entity(item) {
                            self.attach_one(&child_store, item, chain).await?;
                        }
                    }
                }
            }
            Ok(())
        })
    }

    async fn attach_one(
        &self,
        child_store: &str,
        embedded: &mut Value,
        chain: &mut Vec<String>,
    ) -> CoreResult<()> {
        let Some(pkey) = embedded.get(PKEY).and_then(Value::as_str).map(str::to_string)
        else {
            return Ok(());
        };
        // The embedded tag names the origin store; fall back to the link
        // declaration when absent.
        let store_name = embedded
            .get(STORE_TAG)
            .and_then(Value::as_str)
            .unwrap_or(child_store)
            .to_string();

        let fetched = match self.ctx.engine.get(&store_name, &pkey).await {
            Ok(row) => row,
            Err(EngineError::StoreNotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        if let Some(mut fresh) = fetched {
            chain.push(store_name.clone());
            self.attach_children(&store_name, &mut fresh, chain).await?;
            chain.pop();
            tag_entity(&mut fresh, &pkey, &store_name);
            *embedded = fresh;
        }
        Ok(())
    }
}

/// Stable sort over a resolved dot path; rows without the path (including
/// primitives) fall back to comparing the rows themselves.
pub(crate) fn sort_rows(rows: &mut [Value], sort: Option<&SortSpec>) {
    let Some(spec) = sort else {
        return;
    };
    rows.sort_by(|a, b| {
        let key_a = resolve_path(a, &spec.path).unwrap_or(a);
        let key_b = resolve_path(b, &spec.path).unwrap_or(b);
        let ord = compare_values(key_a, key_b);
        if spec.descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

/// 1-indexed page slice; the full set comes back untouched when it fits a
/// single page or pagination is disabled.
pub(crate) fn paginate(rows: Vec<Value>, page: &PageQuery) -> Vec<Value> {
    if !page.pagination || rows.len() <= page.page_size {
        return rows;
    }
    let page_number = page.page.max(1);
    let start = (page_number - 1) * page.page_size;
    if start >= rows.len() {
        return Vec::new();
    }
    let end = (start + page.page_size).min(rows.len());
    rows[start..end].to_vec()
}

/// Case-insensitive substring match at a dot path, descending into arrays
/// element-wise. `term` must already be lowercase.
pub(crate) fn matches_at_path(value: &Value, path: &str, term: &str) -> bool {
    let segments: Vec<&str> = if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    };
    value_matches(value, &segments, term)
}

fn value_matches(value: &Value, segments: &[&str], term: &str) -> bool {
    if let Value::Array(items) = value {
        return items.iter().any(|item| value_matches(item, segments, term));
    }
    match segments.split_first() {
        None => scalar_to_key(value).is_some_and(|s| s.to_lowercase().contains(term)),
        Some((head, rest)) => value
            .get(*head)
            .is_some_and(|member| value_matches(member, rest, term)),
    }
}

/// Ordered cartesian product of per-rule value lists.
fn cartesian(per_rule: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut combos: Vec<Vec<String>> = vec![Vec::new()];
    for values in per_rule {
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in values {
                let mut extended = combo.clone();
                extended.push(value.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

//! Link graph resolution.
//!
//! The graph is a snapshot adjacency map rebuilt from the registry's link
//! edges. Traversal carries an explicit chain guard so an accidentally
//! cyclic declaration surfaces as [`CoreError::LinkCycle`] instead of
//! recursing forever.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;

/// One ancestor of a store in the link graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorRef {
    /// The ancestor store.
    pub store: String,
    /// Property under which the ancestor embeds its direct child.
    pub property: String,
    /// The ancestor's own first parent, if it has one.
    pub grandparent: Option<String>,
    /// Accumulated dot path from the ancestor's rows down to the embedded
    /// target entity.
    pub path: String,
}

/// A snapshot of the declared link graph.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    /// store → property → child store.
    edges: BTreeMap<String, BTreeMap<String, String>>,
}

impl LinkGraph {
    /// Builds a graph from the registry's link edges.
    #[must_use]
    pub fn new(edges: &BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self {
            edges: edges.clone(),
        }
    }

    /// Direct children of a store: property → child store.
    #[must_use]
    pub fn descendants_of(&self, store: &str) -> BTreeMap<String, String> {
        self.edges.get(store).cloned().unwrap_or_default()
    }

    /// Every direct or transitive ancestor of a store.
    ///
    /// For each ancestor the accumulated `path` addresses the embedded
    /// target inside that ancestor's rows (`person.location` for a
    /// grandparent embedding `person` which embeds `location`). Order:
    /// breadth over the direct parents, then depth-first into each
    /// parent's own ancestors, so the nearest ancestors come first.
    pub fn ancestors_of(&self, store: &str) -> CoreResult<Vec<AncestorRef>> {
        let mut out = Vec::new();
        let mut chain = vec![store.to_string()];
        self.collect_ancestors(store, "", &mut chain, &mut out)?;
        Ok(out)
    }

    fn collect_ancestors(
        &self,
        target: &str,
        suffix: &str,
        chain: &mut Vec<String>,
        out: &mut Vec<AncestorRef>,
    ) -> CoreResult<()> {
        let mut found = Vec::new();
        for (parent, edges) in &self.edges {
            for (property, child) in edges {
                if child != target {
                    continue;
                }
                if chain.iter().any(|visited| visited == parent) {
                    return Err(CoreError::link_cycle(parent.clone()));
                }
                let path = if suffix.is_empty() {
                    property.clone()
                } else {
                    format!("{property}.{suffix}")
                };
                out.push(AncestorRef {
                    store: parent.clone(),
                    property: property.clone(),
                    grandparent: self.first_parent_of(parent),
                    path: path.clone(),
                });
                found.push((parent.clone(), path));
            }
        }
        for (parent, path) in found {
            chain.push(parent.clone());
            self.collect_ancestors(&parent, &path, chain, out)?;
            chain.pop();
        }
        Ok(())
    }

    fn first_parent_of(&self, store: &str) -> Option<String> {
        for (parent, edges) in &self.edges {
            if edges.values().any(|child| child == store) {
                return Some(parent.clone());
            }
        }
        None
    }
}

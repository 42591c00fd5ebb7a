//! Trigger declarations: pre-declared compound indices resolved from a
//! request context.

use mimicdb_engine::IndexDef;
use mimicdb_value::derive_identity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where a trigger rule takes its lookup value from at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleSource {
    /// A UUID-shaped segment at a fixed position of the request path.
    PathId {
        /// 0-indexed position among the non-empty path segments.
        position: usize,
    },
    /// A request parameter.
    Param {
        /// Parameter name.
        name: String,
        /// Resolve every value of the parameter, not just the first.
        #[serde(default)]
        multi: bool,
        /// Use the parameter for substring search instead of exact keys.
        #[serde(default)]
        search: bool,
    },
}

/// One ordered rule of a trigger.
///
/// `path` addresses the entity property the rule matches against; `source`
/// says how the lookup value is resolved from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRule {
    /// Dot path into the entity.
    pub path: String,
    /// Resolution source.
    pub source: RuleSource,
}

impl TriggerRule {
    /// Binds an entity path to a UUID path segment.
    #[must_use]
    pub fn path_id(path: impl Into<String>, position: usize) -> Self {
        Self {
            path: path.into(),
            source: RuleSource::PathId { position },
        }
    }

    /// Binds an entity path to a request parameter.
    #[must_use]
    pub fn param(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: RuleSource::Param {
                name: name.into(),
                multi: false,
                search: false,
            },
        }
    }

    /// Marks a parameter rule multi-valued.
    #[must_use]
    pub fn multi(mut self) -> Self {
        if let RuleSource::Param { multi, .. } = &mut self.source {
            *multi = true;
        }
        self
    }

    /// Marks a parameter rule for substring search.
    #[must_use]
    pub fn search(mut self) -> Self {
        if let RuleSource::Param { search, .. } = &mut self.source {
            *search = true;
        }
        self
    }

    /// Returns `true` if the rule filters by substring instead of keying.
    #[must_use]
    pub const fn is_search(&self) -> bool {
        matches!(self.source, RuleSource::Param { search: true, .. })
    }

    /// Resolves the rule's lookup values from a request.
    ///
    /// Key rules yield the values forming the compound key; search rules
    /// yield the terms to match. An empty result means the request does
    /// not carry the rule's input.
    #[must_use]
    pub fn resolve(&self, request: &RequestContext) -> Vec<String> {
        match &self.source {
            RuleSource::PathId { position } => request
                .path_segment(*position)
                .and_then(|segment| derive_identity(&Value::String(segment.to_string())))
                .into_iter()
                .collect(),
            RuleSource::Param { name, multi, .. } => {
                let values = request.params.get(name).cloned().unwrap_or_default();
                if *multi {
                    values
                } else {
                    values.into_iter().take(1).collect()
                }
            }
        }
    }
}

/// A named compound index plus the rules resolving its key components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    /// Trigger (and index) name.
    pub name: String,
    /// Ordered rules.
    pub rules: Vec<TriggerRule>,
}

impl Trigger {
    /// Creates a trigger.
    #[must_use]
    pub fn new(name: impl Into<String>, rules: Vec<TriggerRule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    /// Key rules, in declaration order.
    pub fn key_rules(&self) -> impl Iterator<Item = &TriggerRule> {
        self.rules.iter().filter(|rule| !rule.is_search())
    }

    /// Search rules, in declaration order.
    pub fn search_rules(&self) -> impl Iterator<Item = &TriggerRule> {
        self.rules.iter().filter(|rule| rule.is_search())
    }

    /// The concrete index this trigger converts into at store creation.
    ///
    /// Search rules contribute no key component; a trigger made only of
    /// search rules has no index and reads fall back to a scan.
    #[must_use]
    pub fn index_def(&self) -> Option<IndexDef> {
        let key_paths: Vec<String> = self.key_rules().map(|rule| rule.path.clone()).collect();
        if key_paths.is_empty() {
            None
        } else {
            Some(IndexDef::compound(self.name.clone(), key_paths))
        }
    }
}

/// The request-shaped context a trigger resolves against.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request path, `/`-separated.
    pub path: String,
    /// Request parameters; each may carry several values.
    pub params: BTreeMap<String, Vec<String>>,
}

impl RequestContext {
    /// Creates a context for a request path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a parameter value, appending to any existing values.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Returns the non-empty path segment at `position`.
    #[must_use]
    pub fn path_segment(&self, position: usize) -> Option<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).nth(position)
    }
}

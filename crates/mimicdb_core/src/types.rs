//! Public query and report types.

use crate::schema::CascadeType;
use serde::{Deserialize, Serialize};

/// Outcome of a persist call for one touched store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReport {
    /// Name of the store.
    pub store_name: String,
    /// Rows committed; zero when the store is structure-only.
    pub rows_written: usize,
    /// Names of the indices the store carries after the write.
    pub index_names: Vec<String>,
}

/// Outcome of a delete/drop for one affected store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// Name of the affected store.
    pub store_name: String,
    /// Primary keys of the affected rows.
    pub primary_keys: Vec<String>,
    /// Dot path at which the rows were affected.
    pub path: String,
    /// Cascade policy that was applied.
    pub cascade: CascadeType,
}

/// A by-key lookup request.
#[derive(Debug, Clone, Default)]
pub struct KeyQuery {
    /// Primary keys (or index keys, see `index`) to look up.
    pub primary_keys: Vec<String>,
    /// Optional named index to resolve keys against instead of `__pkey__`.
    pub index: Option<String>,
}

impl KeyQuery {
    /// Builds a primary-key query for one key.
    #[must_use]
    pub fn single(key: impl Into<String>) -> Self {
        Self {
            primary_keys: vec![key.into()],
            ..Self::default()
        }
    }

    /// Builds a primary-key query for many keys.
    #[must_use]
    pub fn many<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            primary_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Resolves the keys via the named index instead of the primary key.
    #[must_use]
    pub fn via_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }
}

/// A pagination request. Pages are 1-indexed.
#[derive(Debug, Clone, Copy)]
pub struct PageQuery {
    /// 1-indexed page number.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Set to `false` to return the full set untouched.
    pub pagination: bool,
}

impl PageQuery {
    /// Builds a pagination request.
    #[must_use]
    pub const fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            pagination: true,
        }
    }

    /// Disables pagination while keeping the query shape.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            page: 1,
            page_size: 0,
            pagination: false,
        }
    }
}

/// A sort request over one dot path.
#[derive(Debug, Clone)]
pub struct SortSpec {
    /// Dot path whose value orders the rows.
    pub path: String,
    /// Descending instead of the default ascending.
    pub descending: bool,
}

impl SortSpec {
    /// Ascending sort over a dot path.
    #[must_use]
    pub fn ascending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            descending: false,
        }
    }

    /// Descending sort over a dot path.
    #[must_use]
    pub fn descending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            descending: true,
        }
    }
}

/// A substring search request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Term matched case-insensitively as a substring.
    pub term: String,
    /// Dot path (index name) searched.
    pub index: String,
    /// Optional cap on the number of results.
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Builds a search over one dot path.
    #[must_use]
    pub fn new(term: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            index: index.into(),
            limit: None,
        }
    }

    /// Caps the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

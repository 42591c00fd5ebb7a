//! # MimicDB Core
//!
//! A schema-inferring, linked-object persistence and query engine for
//! faking a backend during frontend development.
//!
//! Nested JSON objects are decomposed into per-store rows along declared
//! link schemas, indexed (including compound trigger indices), queried by
//! key, page, trigger, search or predicate, and pruned with cascade
//! semantics across the link graph. This crate provides:
//!
//! - The durable settings registry and link graph resolver
//! - The write coordinator (decomposition, index inference, re-linking)
//! - The read coordinator (link re-assembly, sort, pagination, search)
//! - The delete coordinator (cascading delete and prune)
//! - The [`Database`] facade tying them to an engine and sidecar

mod config;
mod context;
mod database;
mod delete;
mod error;
mod generate;
mod links;
mod read;
mod schema;
mod types;
mod write;

pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use generate::{Generator, RandomGenerator, ValueTemplate, ValueTemplateMap};
pub use links::{AncestorRef, LinkGraph};
pub use schema::{
    CascadeType, IndexCleanup, PendingMutations, RequestContext, RuleSource, SchemaRegistry,
    Settings, StoreOptions, Trigger, TriggerRule,
};
pub use types::{CascadeReport, KeyQuery, PageQuery, SearchQuery, SortSpec, StoreReport};

// Re-export the seams callers wire a database from.
pub use mimicdb_engine::{EngineError, MemoryEngine, StorageEngine};
pub use mimicdb_storage::{FileSidecar, MemorySidecar, SidecarStore};

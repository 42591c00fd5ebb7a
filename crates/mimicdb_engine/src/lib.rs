//! # MimicDB Engine
//!
//! The embedded object-store engine behind MimicDB.
//!
//! This crate models the host environment's transactional, versioned
//! object database as an async trait plus a reference in-memory
//! implementation:
//!
//! - Named object stores keyed by the synthesized `__pkey__` member
//! - Per-store secondary indices over dot paths, single or compound,
//!   with exact lookup and lexicographic range queries
//! - Multi-store write batches committed store-by-store with per-row
//!   error aggregation (committed rows are never rolled back)
//! - Versioned structural `open` applying store/index creation and removal

mod engine;
mod error;
mod index;
mod store;
mod types;

pub use engine::{MemoryEngine, StorageEngine};
pub use error::{EngineError, EngineResult};
pub use index::StoreIndex;
pub use store::ObjectStore;
pub use types::{IndexDef, SchemaPlan, StoreSchema, StoreWriteSummary, StoreWrites, WriteBatch};

//! # MimicDB Storage
//!
//! The durable small-object sidecar store for MimicDB.
//!
//! Schema settings and the engine's structural map are persisted outside
//! the main object-store engine so they survive engine re-initialization.
//! This crate provides:
//!
//! - [`SidecarStore`] - the key → string storage trait
//! - [`MemorySidecar`] - in-memory implementation for tests
//! - [`FileSidecar`] - file-backed implementation with advisory locking

mod backend;
mod error;
mod file;
mod memory;

pub use backend::SidecarStore;
pub use error::{StorageError, StorageResult};
pub use file::FileSidecar;
pub use memory::MemorySidecar;

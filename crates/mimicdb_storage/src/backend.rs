//! Sidecar store trait definition.

use crate::error::StorageResult;

/// A durable small-object store mapping string keys to string values.
///
/// Sidecar stores are **opaque blob stores**. MimicDB owns all value
/// interpretation - backends do not understand settings, links, or
/// structural maps.
///
/// # Invariants
///
/// - `get` on a key never written (or since removed) returns `Ok(None)` -
///   a missing key means "uninitialized", never an error
/// - `set` overwrites any previous value for the key
/// - values written by `set` are durable per the backend's own guarantee
/// - Backends must be `Send + Sync` so a single handle can be shared
///
/// # Implementors
///
/// - [`super::MemorySidecar`] - for tests and ephemeral engines
/// - [`super::FileSidecar`] - for persistent settings
pub trait SidecarStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure; a missing key is `None`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be made durable.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the value stored under `key`.
    ///
    /// Removing a missing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be made durable.
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

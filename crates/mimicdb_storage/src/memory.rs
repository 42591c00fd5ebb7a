//! In-memory sidecar store for testing.

use crate::backend::SidecarStore;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory sidecar store.
///
/// Suitable for unit tests, integration tests, and ephemeral databases
/// that don't need settings to survive the process.
///
/// # Example
///
/// ```rust
/// use mimicdb_storage::{MemorySidecar, SidecarStore};
///
/// let mut sidecar = MemorySidecar::new();
/// sidecar.set("settings", "{}").unwrap();
/// assert_eq!(sidecar.get("settings").unwrap().as_deref(), Some("{}"));
/// ```
#[derive(Debug, Default)]
pub struct MemorySidecar {
    data: RwLock<HashMap<String, String>>,
}

impl MemorySidecar {
    /// Creates a new empty in-memory sidecar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns `true` if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl SidecarStore for MemorySidecar {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.data.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_none() {
        let sidecar = MemorySidecar::new();
        assert_eq!(sidecar.get("absent").unwrap(), None);
    }

    #[test]
    fn set_then_get() {
        let mut sidecar = MemorySidecar::new();
        sidecar.set("a", "1").unwrap();
        assert_eq!(sidecar.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn set_overwrites() {
        let mut sidecar = MemorySidecar::new();
        sidecar.set("a", "1").unwrap();
        sidecar.set("a", "2").unwrap();
        assert_eq!(sidecar.get("a").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut sidecar = MemorySidecar::new();
        sidecar.set("a", "1").unwrap();
        sidecar.remove("a").unwrap();
        sidecar.remove("a").unwrap();
        assert_eq!(sidecar.get("a").unwrap(), None);
        assert!(sidecar.is_empty());
    }
}

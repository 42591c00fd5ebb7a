//! Error types for the sidecar store.

use std::io;
use thiserror::Error;

/// Result type for sidecar operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in sidecar storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The persisted sidecar file is not valid.
    #[error("invalid sidecar format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Another process holds the sidecar lock.
    #[error("sidecar locked: another process has exclusive access")]
    Locked,
}

impl StorageError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}

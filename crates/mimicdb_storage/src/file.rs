//! File-backed sidecar store.

use crate::backend::SidecarStore;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of the advisory lock file placed next to the data file.
const LOCK_SUFFIX: &str = "lock";

/// A file-backed sidecar store.
///
/// The whole key → value map is kept in memory and flushed to disk as a
/// JSON object on every mutation. An advisory `fs2` lock next to the data
/// file keeps a second process from opening the same sidecar.
///
/// # Example
///
/// ```no_run
/// use mimicdb_storage::{FileSidecar, SidecarStore};
/// use std::path::Path;
///
/// let mut sidecar = FileSidecar::open(Path::new("db/settings.json")).unwrap();
/// sidecar.set("mimicdb::settings", "{}").unwrap();
/// ```
#[derive(Debug)]
pub struct FileSidecar {
    path: PathBuf,
    data: HashMap<String, String>,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl FileSidecar {
    /// Opens or creates a file sidecar at the given path.
    ///
    /// Parent directories are created if needed. If the file exists, its
    /// contents are loaded; otherwise the sidecar starts empty and the
    /// file is written on the first mutation.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another process holds the lock,
    /// [`StorageError::InvalidFormat`] if the existing file is not a JSON
    /// string map, or an I/O error.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let lock_path = path.with_extension(LOCK_SUFFIX);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }

        let data = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    StorageError::invalid_format(format!(
                        "sidecar file {} is not a string map: {e}",
                        path.display()
                    ))
                })?
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the full map to a temp file, then renames over the target.
    fn flush(&self) -> StorageResult<()> {
        let serialized = serde_json::to_string_pretty(&self.data)
            .map_err(|e| StorageError::invalid_format(e.to_string()))?;

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(serialized.as_bytes())?;
            tmp.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SidecarStore for FileSidecar {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.data.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        if self.data.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

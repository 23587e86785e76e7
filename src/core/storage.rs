//! Client-side key-value storage for drafts and the active session.
//!
//! Values are JSON strings. [`FileStore`] writes through to a single JSON object on
//! disk on every `set`, so nothing is lost if the process stops between mutations.
//! Each write goes to a sibling temporary file that is then renamed over the store,
//! so the file on disk is always a complete object.
//! [`MemoryStore`] backs tests.

use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Synchronous string key-value storage scoped to one user profile.
pub trait LocalStore: Send + Sync {
    /// Returns the stored value, `None` if the key was never set.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Stores or replaces a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removes a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Store shared between the draft store and the session.
pub type SharedStore = Arc<dyn LocalStore>;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| Error::Storage {
        message: "Failed to acquire local storage lock".to_string(),
    })
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object in a file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store, loading existing entries if the file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not a JSON object
    /// of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::Storage {
                message: format!("Failed to read local storage file {path:?}: {e}"),
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };
        info!("Opened local storage at {:?} ({} keys)", path, entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling of the store file that each flush writes before renaming.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("local_storage"), OsString::from);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let staging = self.staging_path();
        let written = std::fs::File::create(&staging)
            .and_then(|mut file| {
                file.write_all(contents.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| std::fs::rename(&staging, &self.path));
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&staging) {
                debug!("Left staging file {:?} behind: {}", staging, cleanup);
            }
            return Err(Error::Storage {
                message: format!("Failed to write local storage file {:?}: {e}", self.path),
            });
        }
        debug!("Flushed {} keys to {:?}", entries.len(), self.path);
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = lock(&self.entries)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_memory_store_get_set_remove() -> Result<()> {
        let store = MemoryStore::new();
        assert_eq!(store.get("curations")?, None);
        store.set("curations", "[]")?;
        assert_eq!(store.get("curations")?.as_deref(), Some("[]"));
        store.remove("curations")?;
        store.remove("curations")?;
        assert_eq!(store.get("curations")?, None);
        Ok(())
    }

    #[test]
    fn test_file_store_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("local_storage.json");

        let store = FileStore::open(&path)?;
        store.set("active_curation", "{\"a\":1}")?;
        store.set("curations", "[]")?;
        drop(store);

        let reopened = FileStore::open(&path)?;
        assert_eq!(
            reopened.get("active_curation")?.as_deref(),
            Some("{\"a\":1}")
        );
        reopened.remove("active_curation")?;
        drop(reopened);

        let reopened = FileStore::open(&path)?;
        assert_eq!(reopened.get("active_curation")?, None);
        assert_eq!(reopened.get("curations")?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("local_storage.json");
        std::fs::write(&path, "not json")?;
        assert!(matches!(
            FileStore::open(&path),
            Err(Error::Serialization(_))
        ));
        Ok(())
    }

    #[test]
    fn test_file_store_replaces_file_whole() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("local_storage.json");
        let store = FileStore::open(&path)?;
        let staging = store.staging_path();
        assert_eq!(staging, dir.path().join("local_storage.json.tmp"));

        // a torn write from an earlier crash is left in the staging file only
        std::fs::write(&staging, "{\"curations\": \"[")?;
        store.set("curations", "[]")?;
        assert!(!staging.exists());

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(on_disk.get("curations").map(String::as_str), Some("[]"));
        assert_eq!(FileStore::open(&path)?.get("curations")?.as_deref(), Some("[]"));
        Ok(())
    }
}

//! Durable key-value storage backends for the history ledger

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::HistoryError;

/// Durable string key-value storage
///
/// Values are written whole; there are no partial updates.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, HistoryError>;

    fn set(&self, key: &str, value: &str) -> Result<(), HistoryError>;
}

/// One `<key>.json` file per key inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating it if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "FileStorage::open: opened");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, HistoryError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the old value
    fn set(&self, key: &str, value: &str) -> Result<(), HistoryError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "FileStorage::set: written");
        Ok(())
    }
}

/// In-memory storage; clones share the same map, so a clone outlives a
/// dropped store the way a browser's local storage outlives a page.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, HistoryError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| HistoryError::Storage("memory storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), HistoryError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| HistoryError::Storage("memory storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_roundtrip() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::open(temp.path().join("nested")).unwrap();

        assert_eq!(storage.get("recent_songs").unwrap(), None);

        storage.set("recent_songs", "[]").unwrap();
        assert_eq!(storage.get("recent_songs").unwrap().as_deref(), Some("[]"));

        storage.set("recent_songs", "[1]").unwrap();
        assert_eq!(storage.get("recent_songs").unwrap().as_deref(), Some("[1]"));
        assert!(!temp.path().join("nested").join(".recent_songs.json.tmp").exists());
    }

    #[test]
    fn test_memory_storage_clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(other.get("missing").unwrap(), None);
    }
}

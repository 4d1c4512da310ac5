//! Tab file storage backends
//!
//! The tab store writes relative, forward-slash paths through this trait;
//! the backend is chosen once at construction. Filesystem for real tills,
//! memory for tests and platforms without a writable data directory.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::kv::{StoreError, StoreResult};

/// Flat text-file storage keyed by relative path.
pub trait TabStorage: Send + Sync {
    /// Read a file; `None` when it does not exist.
    fn read(&self, path: &str) -> StoreResult<Option<String>>;
    fn write(&self, path: &str, content: &str) -> StoreResult<()>;
    /// Remove a file; removing an absent file is not an error.
    fn remove(&self, path: &str) -> StoreResult<()>;
    fn exists(&self, path: &str) -> StoreResult<bool>;
}

/// Filesystem-backed storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FsTabStorage {
    root: PathBuf,
}

impl FsTabStorage {
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != "..") {
            full.push(segment);
        }
        full
    }
}

impl TabStorage for FsTabStorage {
    fn read(&self, path: &str) -> StoreResult<Option<String>> {
        match std::fs::read_to_string(self.resolve(path)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn write(&self, path: &str, content: &str) -> StoreResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, content)?;
        Ok(())
    }

    fn remove(&self, path: &str) -> StoreResult<()> {
        match std::fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.resolve(path).exists())
    }
}

/// In-memory storage for tests and ephemeral targets.
#[derive(Debug, Clone, Default)]
pub struct MemoryTabStorage {
    files: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryTabStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabStorage for MemoryTabStorage {
    fn read(&self, path: &str) -> StoreResult<Option<String>> {
        Ok(self.files.read().get(path).cloned())
    }

    fn write(&self, path: &str, content: &str) -> StoreResult<()> {
        self.files
            .write()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn remove(&self, path: &str) -> StoreResult<()> {
        self.files.write().remove(path);
        Ok(())
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.files.read().contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn TabStorage) {
        assert_eq!(storage.read("TABDATA/BAR/5/tabledata.csv").unwrap(), None);
        assert!(!storage.exists("TABDATA/BAR/5/tabledata.csv").unwrap());

        storage
            .write("TABDATA/BAR/5/tabledata.csv", "X,Product\r\n")
            .unwrap();
        assert!(storage.exists("TABDATA/BAR/5/tabledata.csv").unwrap());
        assert_eq!(
            storage.read("TABDATA/BAR/5/tabledata.csv").unwrap().as_deref(),
            Some("X,Product\r\n")
        );

        storage.remove("TABDATA/BAR/5/tabledata.csv").unwrap();
        assert_eq!(storage.read("TABDATA/BAR/5/tabledata.csv").unwrap(), None);
        // Removing again is fine.
        storage.remove("TABDATA/BAR/5/tabledata.csv").unwrap();
    }

    #[test]
    fn memory_storage_basics() {
        exercise(&MemoryTabStorage::new());
    }

    #[test]
    fn fs_storage_basics() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsTabStorage::new(dir.path().join("tabs")).unwrap();
        exercise(&storage);
    }
}

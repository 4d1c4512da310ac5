//! In-memory remote file store
//!
//! Serves a file set from memory. Used by the test suites and by demo
//! setups that run without a reachable back office.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use shared::RemoteFile;

use super::{RemoteError, RemoteFileStore, RemoteResult};

#[derive(Debug, Default)]
struct Inner {
    /// path -> (content, last_modified)
    files: HashMap<String, (String, Option<String>)>,
    /// paths that fail on fetch
    failing: HashSet<String>,
    /// destination -> uploaded files
    uploads: HashMap<String, BTreeMap<String, String>>,
    fail_uploads: bool,
}

/// Remote store backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteStore {
    inner: Arc<RwLock<Inner>>,
    fetch_count: Arc<AtomicUsize>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn put_file(&self, path: &str, content: &str, last_modified: Option<&str>) {
        self.inner.write().files.insert(
            path.to_string(),
            (content.to_string(), last_modified.map(str::to_string)),
        );
    }

    pub fn remove_file(&self, path: &str) {
        self.inner.write().files.remove(path);
    }

    /// Make subsequent fetches of `path` fail.
    pub fn fail_file(&self, path: &str) {
        self.inner.write().failing.insert(path.to_string());
    }

    /// Make subsequent uploads fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.inner.write().fail_uploads = fail;
    }

    /// Number of `get_file` calls served so far (including failures).
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn reset_fetch_count(&self) {
        self.fetch_count.store(0, Ordering::SeqCst);
    }

    /// Files last uploaded to `destination`, if any.
    pub fn uploaded(&self, destination: &str) -> Option<BTreeMap<String, String>> {
        self.inner.read().uploads.get(destination).cloned()
    }
}

#[async_trait]
impl RemoteFileStore for MemoryRemoteStore {
    async fn list_manifest(&self, _site_id: &str) -> RemoteResult<Vec<RemoteFile>> {
        let inner = self.inner.read();
        let mut manifest: Vec<RemoteFile> = inner
            .files
            .iter()
            .map(|(path, (_, stamp))| RemoteFile {
                path: path.clone(),
                last_modified: stamp.clone(),
            })
            .collect();
        manifest.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(manifest)
    }

    async fn get_file(&self, _site_id: &str, path: &str) -> RemoteResult<String> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read();
        if inner.failing.contains(path) {
            return Err(RemoteError::Status(500));
        }
        inner
            .files
            .get(path)
            .map(|(content, _)| content.clone())
            .ok_or(RemoteError::Status(404))
    }

    async fn upload_files(
        &self,
        _site_id: &str,
        destination: &str,
        files: &BTreeMap<String, String>,
    ) -> RemoteResult<()> {
        let mut inner = self.inner.write();
        if inner.fail_uploads {
            return Err(RemoteError::Upload("simulated upload failure".to_string()));
        }
        inner
            .uploads
            .insert(destination.to_string(), files.clone());
        Ok(())
    }
}

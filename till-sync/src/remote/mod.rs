//! Remote file store collaborator
//!
//! The back office exposes exactly three operations: list the manifest,
//! fetch one file as text, and upload a named set of files into a
//! destination folder. Everything else in this crate is built on those.

mod http;
mod memory;

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use shared::RemoteFile;

/// Remote store error type
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the file API
    #[error("Server returned status {0}")]
    Status(u16),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Upload rejected by the server
    #[error("Upload failed: {0}")]
    Upload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// File-manifest/file-fetch API of the back office.
///
/// Manifest paths may come back with backslashes and a `DATA/` root; the
/// sync engine normalizes them before use.
#[async_trait]
pub trait RemoteFileStore: Send + Sync {
    /// List every file the site currently exposes.
    async fn list_manifest(&self, site_id: &str) -> RemoteResult<Vec<RemoteFile>>;

    /// Fetch one file body as text.
    async fn get_file(&self, site_id: &str, path: &str) -> RemoteResult<String>;

    /// Upload a set of named files into a destination folder
    /// (legacy backslash path, e.g. `TABDATA\BAR\5`).
    async fn upload_files(
        &self,
        site_id: &str,
        destination: &str,
        files: &BTreeMap<String, String>,
    ) -> RemoteResult<()>;
}

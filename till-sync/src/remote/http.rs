//! HTTP implementation of the remote file store

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use shared::RemoteFile;

use super::{RemoteError, RemoteFileStore, RemoteResult};

/// Wire shape of one manifest entry.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    path: String,
    #[serde(rename = "lastModified")]
    last_modified: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    destination: &'a str,
    files: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    error: Option<String>,
}

/// Remote file store over the back office's HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    /// Build a store for the given gateway base URL with a bounded
    /// per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn check_status(response: &reqwest::Response) -> RemoteResult<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteFileStore for HttpRemoteStore {
    async fn list_manifest(&self, site_id: &str) -> RemoteResult<Vec<RemoteFile>> {
        let url = format!("{}/api/files/{}/manifest", self.base_url, site_id);
        let response = self.client.get(&url).send().await?;
        Self::check_status(&response)?;

        let entries: Vec<ManifestEntry> = response.json().await?;
        Ok(entries
            .into_iter()
            .map(|e| RemoteFile {
                path: e.path,
                last_modified: e.last_modified,
            })
            .collect())
    }

    async fn get_file(&self, site_id: &str, path: &str) -> RemoteResult<String> {
        let url = format!("{}/api/files/{}/content", self.base_url, site_id);
        let response = self
            .client
            .get(&url)
            .query(&[("path", path)])
            .send()
            .await?;
        Self::check_status(&response)?;

        // Legacy exports are not reliably UTF-8; fall back to Windows-1252,
        // the code page the back office actually writes.
        let bytes = response.bytes().await?;
        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => {
                let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
                Ok(text.into_owned())
            }
        }
    }

    async fn upload_files(
        &self,
        site_id: &str,
        destination: &str,
        files: &BTreeMap<String, String>,
    ) -> RemoteResult<()> {
        let url = format!("{}/api/files/{}/upload", self.base_url, site_id);
        let body = UploadRequest { destination, files };
        let response = self.client.post(&url).json(&body).send().await?;
        Self::check_status(&response)?;

        let result: UploadResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        if !result.success {
            return Err(RemoteError::Upload(
                result.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        Ok(())
    }
}

//! Remote manifest types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the server file manifest.
///
/// `last_modified` is whatever opaque stamp the back office reports for the
/// file; it is compared for equality only, never parsed as a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub path: String,
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl RemoteFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, stamp: impl Into<String>) -> Self {
        self.last_modified = Some(stamp.into());
        self
    }
}

/// Persisted `path -> last_modified` map from the last fully successful sync.
///
/// Written only after a run completes, so a retried run always re-selects
/// every file the failed run would have fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    pub files: BTreeMap<String, Option<String>>,
}

impl ManifestSnapshot {
    pub fn from_manifest(manifest: &[RemoteFile]) -> Self {
        Self {
            files: manifest
                .iter()
                .map(|f| (f.path.clone(), f.last_modified.clone()))
                .collect(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Option<String>> {
        self.files.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = ManifestSnapshot::from_manifest(&[
            RemoteFile::new("MENUDATA/MENU1.CSV").with_last_modified("2026-08-01T10:00:00Z"),
            RemoteFile::new("VATDATA/A.VATCODE"),
        ]);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ManifestSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(
            back.get("MENUDATA/MENU1.CSV"),
            Some(&Some("2026-08-01T10:00:00Z".to_string()))
        );
        assert_eq!(back.get("VATDATA/A.VATCODE"), Some(&None));
    }
}

//! Manifest filtering and incremental diff

use std::sync::OnceLock;

use regex::Regex;

use shared::{ManifestSnapshot, RemoteFile};

use crate::flatfile::normalize_path;

/// Top-level folders the engine syncs, in progress-display priority order.
/// Everything else on the share (logs, exports, backups) is ignored.
const ALLOWED_FOLDERS: [&str; 6] = [
    "VATDATA",
    "PLUDATA",
    "MENUDATA",
    "TENDERDATA",
    "OPERATORDATA",
    "TABDATA",
];

fn bak_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.bak(_\d+)?(?:/|$)").unwrap())
}

fn folder_priority(path: &str) -> usize {
    let folder = path.split('/').next().unwrap_or_default();
    ALLOWED_FOLDERS
        .iter()
        .position(|f| folder.eq_ignore_ascii_case(f))
        .unwrap_or(ALLOWED_FOLDERS.len())
}

/// Top-level folder of a path, for progress messages.
pub(crate) fn top_folder(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

/// Normalize, filter and order the raw manifest.
///
/// Keeps only allow-listed top-level folders; drops `ERRORCORRECT.PLU` and
/// `.bak`/`.bak_<n>` suffixes anywhere in the path. The sort (folder
/// priority, then alphabetical) exists purely so progress messages name a
/// sensible "currently syncing" folder — downloads remain concurrent.
pub fn filter_manifest(manifest: &[RemoteFile]) -> Vec<RemoteFile> {
    let mut filtered: Vec<RemoteFile> = manifest
        .iter()
        .map(|f| RemoteFile {
            path: normalize_path(&f.path),
            last_modified: f.last_modified.clone(),
        })
        .filter(|f| {
            folder_priority(&f.path) < ALLOWED_FOLDERS.len()
                && !f.path.to_ascii_uppercase().contains("ERRORCORRECT.PLU")
                && !bak_re().is_match(&f.path)
        })
        .collect();

    filtered.sort_by(|a, b| {
        folder_priority(&a.path)
            .cmp(&folder_priority(&b.path))
            .then_with(|| a.path.cmp(&b.path))
    });
    filtered
}

/// Select the files an incremental run must fetch.
///
/// A file is selected when it has no recorded metadata or its
/// `last_modified` differs from the stored value. A file the server reports
/// without a `last_modified` cannot be change-detected and is only
/// re-fetched by a full sync.
pub fn diff_manifest(filtered: &[RemoteFile], snapshot: &ManifestSnapshot) -> Vec<RemoteFile> {
    filtered
        .iter()
        .filter(|f| match snapshot.get(&f.path) {
            None => true,
            Some(stored) => f.last_modified.is_some() && *stored != f.last_modified,
        })
        .cloned()
        .collect()
}

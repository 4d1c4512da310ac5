//! The sync engine

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use shared::util::now_millis;
use shared::{Catalog, ManifestSnapshot, SyncPhase, SyncProgress};

use super::manifest::{diff_manifest, filter_manifest, top_folder};
use crate::catalog::{SourceFile, build_catalog, default_tenders};
use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::kv::KvStore;
use crate::remote::RemoteFileStore;

const KEY_MANIFEST: &str = "sync.manifest";
const KEY_LAST_SYNC: &str = "sync.last_sync";

const KEY_GROUPS: &str = "catalog.groups";
const KEY_DEPARTMENTS: &str = "catalog.departments";
const KEY_PRODUCTS: &str = "catalog.products";
const KEY_MENUS: &str = "catalog.menus";
const KEY_TENDERS: &str = "catalog.tenders";
const KEY_VAT_RATES: &str = "catalog.vat_rates";
const KEY_TABLES: &str = "catalog.tables";
const KEY_OPERATORS: &str = "catalog.operators";

/// How a run treats the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Re-fetch everything and overwrite every collection wholesale, even
    /// to empty, so server-side deletions propagate.
    Full,
    /// Fetch only changed files and merge per collection.
    Incremental,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Files in the filtered manifest.
    pub manifest_files: usize,
    /// Files this run actually fetched.
    pub fetched: usize,
    /// Files that degraded to empty content after a failed download.
    pub failed: usize,
    /// True when an incremental run found nothing to do and exited early.
    pub no_changes: bool,
}

type ProgressFn = Arc<dyn Fn(SyncProgress) + Send + Sync>;

/// Releases the in-flight flag when the run ends, on every exit path.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates manifest diff, batched parallel download, catalog rebuild
/// and metadata persistence.
///
/// The engine is not re-entrant: a second `sync` while one is in flight is
/// rejected with [`SyncError::AlreadyRunning`] rather than racing.
pub struct SyncEngine<R, K> {
    remote: R,
    kv: K,
    config: EngineConfig,
    in_flight: AtomicBool,
    on_progress: Option<ProgressFn>,
}

impl<R: RemoteFileStore, K: KvStore> SyncEngine<R, K> {
    pub fn new(remote: R, kv: K, config: EngineConfig) -> Self {
        Self {
            remote,
            kv,
            config,
            in_flight: AtomicBool::new(false),
            on_progress: None,
        }
    }

    /// Install a progress callback.
    pub fn with_progress(mut self, callback: impl Fn(SyncProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    fn report(&self, phase: SyncPhase, current: usize, total: usize, message: impl Into<String>) {
        if let Some(cb) = &self.on_progress {
            cb(SyncProgress::new(phase, current, total, message));
        }
    }

    /// Run one sync.
    ///
    /// Idempotent for [`SyncMode::Full`]; additive for
    /// [`SyncMode::Incremental`]. The manifest snapshot is only written at
    /// the end, so a run that dies part-way leaves the previous snapshot in
    /// place and the retry re-selects everything the dead run would have.
    pub async fn sync(&self, mode: SyncMode) -> SyncResult<SyncReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadyRunning);
        }
        let _guard = FlightGuard(&self.in_flight);

        let site_id = self.config.site_id.clone();
        self.report(
            SyncPhase::Connecting,
            0,
            0,
            format!("Connecting to site {site_id}"),
        );

        let manifest = self
            .remote
            .list_manifest(&site_id)
            .await
            .map_err(SyncError::Manifest)?;
        let filtered = filter_manifest(&manifest);
        tracing::info!(
            raw = manifest.len(),
            filtered = filtered.len(),
            mode = ?mode,
            "Manifest listed"
        );

        let snapshot: ManifestSnapshot = self.get_json(KEY_MANIFEST)?.unwrap_or_default();
        let to_fetch = match mode {
            SyncMode::Full => filtered.clone(),
            SyncMode::Incremental => diff_manifest(&filtered, &snapshot),
        };

        if mode == SyncMode::Incremental && to_fetch.is_empty() {
            tracing::info!("No changes since last sync");
            self.report(SyncPhase::Complete, 0, 0, "No changes since last sync");
            return Ok(SyncReport {
                mode,
                manifest_files: filtered.len(),
                fetched: 0,
                failed: 0,
                no_changes: true,
            });
        }

        let (downloaded, failed) = self.download_batches(&site_id, &to_fetch).await;

        self.report(
            SyncPhase::Parsing,
            to_fetch.len(),
            to_fetch.len(),
            "Rebuilding catalog",
        );
        let mut fresh = build_catalog(&downloaded);
        match mode {
            SyncMode::Full => {
                if fresh.tenders.is_empty() {
                    fresh.tenders = default_tenders();
                }
                self.store_catalog(&fresh)?;
            }
            SyncMode::Incremental => {
                let mut stored = self.catalog()?;
                stored.merge_from(fresh);
                self.store_catalog(&stored)?;
            }
        }

        // Metadata covers the whole filtered manifest, not just the fetched
        // slice, and is written only now that the run has made it through.
        self.set_json(KEY_MANIFEST, &ManifestSnapshot::from_manifest(&filtered))?;
        self.kv.set(KEY_LAST_SYNC, &now_millis().to_string())?;

        self.report(
            SyncPhase::Complete,
            to_fetch.len(),
            to_fetch.len(),
            "Sync complete",
        );

        Ok(SyncReport {
            mode,
            manifest_files: filtered.len(),
            fetched: to_fetch.len(),
            failed,
            no_changes: false,
        })
    }

    /// Download the selected files in fixed-size batches; inside a batch
    /// every fetch runs concurrently. A failed or timed-out file degrades
    /// to empty content and never aborts its batch.
    async fn download_batches(
        &self,
        site_id: &str,
        to_fetch: &[shared::RemoteFile],
    ) -> (Vec<SourceFile>, usize) {
        let total = to_fetch.len();
        let timeout = Duration::from_secs(self.config.fetch_timeout);
        let counter = AtomicUsize::new(0);
        let mut downloaded = Vec::with_capacity(total);
        let mut failed = 0usize;

        self.report(SyncPhase::Downloading, 0, total, "Downloading files");

        for batch in to_fetch.chunks(self.config.batch_size) {
            let results = futures::future::join_all(batch.iter().map(|file| async {
                let fetched =
                    tokio::time::timeout(timeout, self.remote.get_file(site_id, &file.path)).await;
                let content = match fetched {
                    Ok(Ok(text)) => Some(text),
                    Ok(Err(e)) => {
                        tracing::warn!(path = %file.path, error = %e, "Download failed, degrading to empty content");
                        None
                    }
                    Err(_) => {
                        tracing::warn!(path = %file.path, timeout_secs = timeout.as_secs(), "Download timed out, degrading to empty content");
                        None
                    }
                };
                let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
                self.report(
                    SyncPhase::Downloading,
                    current,
                    total,
                    format!("Syncing {}", top_folder(&file.path)),
                );
                (file.path.clone(), content)
            }))
            .await;

            for (path, content) in results {
                match content {
                    Some(content) => downloaded.push(SourceFile::new(path, content)),
                    None => {
                        failed += 1;
                        downloaded.push(SourceFile::new(path, String::new()));
                    }
                }
            }
        }

        (downloaded, failed)
    }

    /// Load the stored catalog (missing collections come back empty).
    pub fn catalog(&self) -> SyncResult<Catalog> {
        Ok(Catalog {
            groups: self.get_json(KEY_GROUPS)?.unwrap_or_default(),
            departments: self.get_json(KEY_DEPARTMENTS)?.unwrap_or_default(),
            products: self.get_json(KEY_PRODUCTS)?.unwrap_or_default(),
            menus: self.get_json(KEY_MENUS)?.unwrap_or_default(),
            tenders: self.get_json(KEY_TENDERS)?.unwrap_or_default(),
            vat_rates: self.get_json(KEY_VAT_RATES)?.unwrap_or_default(),
            tables: self.get_json(KEY_TABLES)?.unwrap_or_default(),
            operators: self.get_json(KEY_OPERATORS)?.unwrap_or_default(),
        })
    }

    fn store_catalog(&self, catalog: &Catalog) -> SyncResult<()> {
        self.set_json(KEY_GROUPS, &catalog.groups)?;
        self.set_json(KEY_DEPARTMENTS, &catalog.departments)?;
        self.set_json(KEY_PRODUCTS, &catalog.products)?;
        self.set_json(KEY_MENUS, &catalog.menus)?;
        self.set_json(KEY_TENDERS, &catalog.tenders)?;
        self.set_json(KEY_VAT_RATES, &catalog.vat_rates)?;
        self.set_json(KEY_TABLES, &catalog.tables)?;
        self.set_json(KEY_OPERATORS, &catalog.operators)?;
        Ok(())
    }

    /// Drop every stored collection and the sync metadata, forcing the next
    /// run to behave like a first sync.
    pub fn clear_stored_data(&self) -> SyncResult<()> {
        self.kv.multi_remove(&[
            KEY_GROUPS,
            KEY_DEPARTMENTS,
            KEY_PRODUCTS,
            KEY_MENUS,
            KEY_TENDERS,
            KEY_VAT_RATES,
            KEY_TABLES,
            KEY_OPERATORS,
            KEY_MANIFEST,
            KEY_LAST_SYNC,
        ])?;
        Ok(())
    }

    /// Millisecond timestamp of the last completed run, if any.
    pub fn last_sync_millis(&self) -> SyncResult<Option<i64>> {
        Ok(self
            .kv
            .get(KEY_LAST_SYNC)?
            .and_then(|v| v.parse::<i64>().ok()))
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> SyncResult<Option<T>> {
        match self.kv.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> SyncResult<()> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, &raw)?;
        Ok(())
    }
}

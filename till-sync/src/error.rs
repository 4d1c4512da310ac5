//! Engine error types

use thiserror::Error;

use crate::kv::StoreError;
use crate::remote::RemoteError;

/// Errors raised by the sync engine.
///
/// Per-file download failures are not errors at this level: they degrade to
/// empty content inside a batch and are only logged. A missing manifest is
/// fatal for the run — there is no catalog without one.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Manifest fetch failed; the run cannot proceed.
    #[error("Manifest fetch failed: {0}")]
    Manifest(#[source] RemoteError),

    /// A sync run is already in flight; the engine is not re-entrant.
    #[error("A sync is already running")]
    AlreadyRunning,

    /// Durable store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by the table-tab store.
#[derive(Debug, Error)]
pub enum TabError {
    /// Local storage failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Remote push failed *after* the local write succeeded. The caller must
    /// not roll back local state; local persistence is the durable source of
    /// truth and the remote side is best-effort.
    #[error("Remote sync failed after local write: {0}")]
    RemoteSync(#[source] RemoteError),
}

/// Result type for tab-store operations
pub type TabResult<T> = Result<T, TabError>;

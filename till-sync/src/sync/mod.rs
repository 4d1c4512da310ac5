//! Sync orchestration
//!
//! Lists the remote manifest, filters and diffs it against the snapshot of
//! the last successful run, downloads the selected files in parallel
//! batches, rebuilds the catalog and persists everything to the durable
//! store.

mod engine;
mod manifest;

pub use engine::{SyncEngine, SyncMode, SyncReport};
pub use manifest::{diff_manifest, filter_manifest};

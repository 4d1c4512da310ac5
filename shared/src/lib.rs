//! Shared types for the till-sync workspace
//!
//! Plain data models used by the sync engine, the catalog builder and the
//! table-tab store, plus small utilities (timestamps, deterministic colors).

pub mod catalog;
pub mod manifest;
pub mod models;
pub mod progress;
pub mod tab;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use catalog::Catalog;
pub use manifest::{ManifestSnapshot, RemoteFile};
pub use progress::{SyncPhase, SyncProgress};

//! Sync and persistence engine for a legacy flat-file till back office.
//!
//! The back office exposes its catalog, operator list, VAT table and
//! per-table order state as a tree of proprietary flat text files behind a
//! file-manifest/file-fetch API. This crate:
//!
//! - discovers and incrementally downloads the changing file set
//!   ([`sync::SyncEngine`]),
//! - deterministically reconstructs the structured catalog from file paths
//!   and ad-hoc `KEY=VALUE` bodies ([`catalog`]),
//! - persists and re-serializes in-progress table orders, including split
//!   bills, back into the same flat-file CSV dialect ([`tabs`]).
//!
//! Screen rendering, printer drivers, payment terminals and update checking
//! live elsewhere; this crate is only the data plane.

pub mod catalog;
pub mod config;
pub mod error;
pub mod flatfile;
pub mod kv;
pub mod logger;
pub mod remote;
pub mod sync;
pub mod tabs;

pub use config::EngineConfig;
pub use error::{SyncError, SyncResult, TabError, TabResult};
pub use remote::{RemoteError, RemoteFileStore};
pub use sync::{SyncEngine, SyncMode, SyncReport};
pub use tabs::TableTabStore;

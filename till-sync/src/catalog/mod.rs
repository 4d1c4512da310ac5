//! Catalog reconstruction from downloaded flat files
//!
//! The back office has no schema API: the product hierarchy, menus, tenders
//! and tables are all recovered from folder-naming conventions and ad-hoc
//! `KEY=VALUE` bodies. [`build_catalog`] is deterministic and pure — same
//! file set in, same catalog out.

mod builder;

pub use builder::{build_catalog, default_tenders};

use crate::flatfile::FileCategory;

/// One downloaded file, classified once at download time.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub category: FileCategory,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let category = FileCategory::classify(&path);
        Self {
            path,
            content: content.into(),
            category,
        }
    }
}

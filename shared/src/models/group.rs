//! Product group and department models
//!
//! Both are derived purely from the first two path segments under the
//! product root; neither exists as a file of its own on the back office.

use serde::{Deserialize, Serialize};

/// Top-level product group (first path segment, e.g. `002 - DRINK`).
///
/// Ids are regenerated on every catalog build; only the name is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub id: u32,
    pub name: String,
}

/// Department inside a group (second path segment, e.g. `010 - Soft Drinks`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: u32,
    pub group_id: u32,
    pub name: String,
}

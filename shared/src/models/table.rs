//! Dining table model

use serde::{Deserialize, Serialize};

/// Physical table, discovered from `TABDATA/<area>/<table>/` paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: u32,
    pub name: String,
    pub area: String,
    pub color: String,
}

impl Table {
    /// Flat-file key for this table, also used for color derivation.
    pub fn key(&self) -> String {
        format!("{}_{}", self.area, self.name)
    }
}

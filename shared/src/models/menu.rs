//! Menu models

use serde::{Deserialize, Serialize};

/// A product reference inside one menu screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub product_name: String,
    /// Referenced PLU filename (final segment of the Windows path column).
    pub filename: String,
    pub hotcode: Option<String>,
    pub color: Option<String>,
}

impl MenuEntry {
    /// The synthetic close-button entry appended to menus that carried a
    /// `BACK.PLU` row.
    pub fn back_button() -> Self {
        Self {
            product_name: "BACK.PLU".to_string(),
            filename: "BACK.PLU".to_string(),
            hotcode: None,
            color: None,
        }
    }

    pub fn is_back_button(&self) -> bool {
        self.filename.eq_ignore_ascii_case("BACK.PLU")
    }
}

/// One menu screen, parsed from `MENUDATA/<name>.CSV`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    /// Numeric suffix of the source filename (`MENU3.CSV` -> 3).
    pub number: u32,
    pub name: String,
    pub entries: Vec<MenuEntry>,
}

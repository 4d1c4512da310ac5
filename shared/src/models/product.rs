//! Product model

use serde::{Deserialize, Serialize};

/// One selectable price of a product.
///
/// `OPEN` (operator keys the price) and `NOT SET` are first-class options
/// with price 0, not parse failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOption {
    /// Source key the option came from (e.g. `PRICE_DOUBLE`).
    pub key: String,
    pub label: String,
    pub price: f64,
}

impl PriceOption {
    pub fn is_open(&self) -> bool {
        self.label == "OPEN"
    }

    pub fn is_not_set(&self) -> bool {
        self.label == "NOT SET"
    }
}

/// Product entity built from one PLU file.
///
/// Identity across syncs is `filename`, not `id` — ids are regenerated on
/// every catalog build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub group_id: u32,
    pub department_id: u32,
    pub prices: Vec<PriceOption>,
    pub vat_code: Option<String>,
    /// Percentage, e.g. `20.0` for 20% VAT.
    pub vat_percentage: f64,
    pub color: Option<String>,
    pub hotcode: Option<String>,
    pub barcode: Option<String>,
    /// PLU filename, e.g. `002-010-10901.PLU`.
    pub filename: String,
    /// A non-sellable product is retained only while a menu references it.
    pub sellable: bool,
}

//! Table order (tab) types
//!
//! A table's open order is persisted as CSV rows across up to five slot
//! files: the main bill plus four split bills. The five slots partition the
//! order disjointly.

use serde::{Deserialize, Serialize};

/// Main bill plus four split bills.
pub const SLOT_COUNT: usize = 5;

/// One serialized order line in the legacy CSV dialect.
///
/// Numeric fields are kept as native values; the writer is responsible for
/// the exact decimal formatting the legacy importer expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDataRow {
    /// Quantity (the `X` column).
    pub quantity: f64,
    pub product: String,
    pub price: f64,
    /// Synthesized PLU filename keying this line on the back office.
    pub plu_file: String,
    pub group: String,
    pub department: String,
    pub vat_code: String,
    pub vat_percentage: f64,
    pub vat_amount: f64,
    pub added_by: String,
    pub added_at: String,
    pub printer1: String,
    pub printer2: String,
    pub printer3: String,
    /// Kept verbatim from the wire (`YES`/`NO`).
    pub printed: String,
}

/// One basket line as the ordering UI holds it, before row synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketLine {
    pub product_name: String,
    pub quantity: f64,
    /// Line price (already multiplied by quantity).
    pub price: f64,
    pub vat_code: String,
    pub vat_percentage: f64,
    /// Numeric group code from the folder prefix (e.g. `002 - DRINK` -> 2).
    pub group_code: u32,
    pub group_name: String,
    /// Numeric department code from the folder prefix.
    pub department_code: u32,
    pub department_name: String,
    /// Per-department product index used in the synthesized PLU filename.
    pub product_index: u32,
    /// Variant label as the UI shows it (`half`, `large`, `175ml`, ...).
    pub variant: Option<String>,
    pub added_by: String,
    pub printer1: String,
    pub printer2: String,
    pub printer3: String,
    pub printed: bool,
}

/// Batch status answer for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatus {
    pub area: String,
    pub table: String,
    pub has_data: bool,
    pub subtotal: f64,
    /// A sibling `tableopen.ini` marker indicates the table is
    /// presence-locked by a till.
    pub locked: bool,
}

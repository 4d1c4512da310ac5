//! VAT rate model

use serde::{Deserialize, Serialize};

/// One entry of the back-office VAT table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatRate {
    pub code: String,
    pub percentage: f64,
}

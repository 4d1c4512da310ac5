//! Tender (payment method) model

use serde::{Deserialize, Serialize};

/// Payment method, one per `.TENDER` file.
///
/// `color` is derived deterministically from the name so every device shows
/// the same button color without any server-side configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
    pub id: u32,
    pub name: String,
    pub color: String,
}

//! Operator model

use serde::{Deserialize, Serialize};

/// Till operator, one per `.OPERATOR` file. Order lines carry the operator
/// name in the `Added By` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: u32,
    pub name: String,
    pub code: Option<String>,
}

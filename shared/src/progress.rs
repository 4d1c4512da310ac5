//! Sync progress reporting types

use serde::{Deserialize, Serialize};

/// Phase of a sync run. `Complete` is terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Connecting,
    Downloading,
    Parsing,
    Complete,
}

/// Progress report delivered through the engine's callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub phase: SyncPhase,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl SyncProgress {
    pub fn new(phase: SyncPhase, current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            phase,
            current,
            total,
            message: message.into(),
        }
    }
}

use crate::domain::value_objects::ActionId;
use serde::{Deserialize, Serialize};

/// Failure detail for one action within a drain cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub action_id: ActionId,
    pub message: String,
}

/// Aggregate result of one drain cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub processed: u32,
    pub failed: u32,
    pub errors: Vec<SyncFailure>,
    /// True when the cycle was a guard no-op (offline or already draining).
    pub skipped: bool,
}

impl SyncReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    pub fn record_failure(&mut self, action_id: ActionId, message: String) {
        self.failed += 1;
        self.errors.push(SyncFailure { action_id, message });
    }
}

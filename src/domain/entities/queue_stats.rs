use serde::{Deserialize, Serialize};

/// Read-only snapshot for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending_count: u64,
    pub failed_count: u64,
    pub is_online: bool,
    pub is_syncing: bool,
}

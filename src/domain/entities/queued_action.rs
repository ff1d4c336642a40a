use crate::domain::value_objects::{ActionId, ActionKind, ActionStatus, TableName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied description of a mutation to defer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDraft {
    pub kind: ActionKind,
    pub target: TableName,
    pub record_id: Option<String>,
    pub payload: Value,
    pub max_retries: u32,
}

impl ActionDraft {
    pub fn new(
        kind: ActionKind,
        target: TableName,
        record_id: Option<String>,
        payload: Value,
        max_retries: u32,
    ) -> Self {
        Self {
            kind,
            target,
            record_id,
            payload,
            max_retries,
        }
    }
}

/// Durable record of one intended mutation against the remote backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: ActionId,
    pub kind: ActionKind,
    pub target: TableName,
    pub record_id: Option<String>,
    pub payload: Value,
    pub status: ActionStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueuedAction {
    /// Builds a fresh pending action from a draft at enqueue time.
    pub fn from_draft(draft: ActionDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: ActionId::generate(),
            kind: draft.kind,
            target: draft.target,
            record_id: draft.record_id,
            payload: draft.payload,
            status: ActionStatus::Pending,
            retry_count: 0,
            max_retries: draft.max_retries,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when one more failed attempt would exhaust the retry budget.
    pub fn on_last_attempt(&self) -> bool {
        self.retry_count + 1 >= self.max_retries
    }
}

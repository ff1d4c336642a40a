use crate::domain::entities::{CacheEntry, QueuedAction};
use crate::domain::value_objects::{ActionId, ActionStatus, TableName};
use crate::shared::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable local persistence for the three offline collections: queued
/// actions, cached records, and settings.
///
/// Every method is a single atomic store operation; partial writes are never
/// observable. Callers that need read-modify-write compose these primitives
/// under the single-threaded cooperative scheduling model.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    async fn insert_action(&self, action: &QueuedAction) -> Result<()>;
    async fn get_action(&self, id: &ActionId) -> Result<Option<QueuedAction>>;
    /// Actions with the given status, in insertion order.
    async fn list_actions_by_status(&self, status: ActionStatus) -> Result<Vec<QueuedAction>>;
    async fn list_actions_by_target(&self, target: &TableName) -> Result<Vec<QueuedAction>>;
    /// Persists status, retry count, and last error in one statement.
    async fn set_action_state(
        &self,
        id: &ActionId,
        status: ActionStatus,
        retry_count: u32,
        last_error: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
    async fn count_actions_by_status(&self, status: ActionStatus) -> Result<u64>;
    /// Retention is the caller's concern; the engine never deletes actions.
    async fn delete_action(&self, id: &ActionId) -> Result<bool>;
    /// Operator-facing reset: all failed actions back to pending, retry
    /// counts preserved. Returns the number of actions reset.
    async fn reset_failed_actions(&self) -> Result<u64>;
    /// Startup recovery: actions left `processing` by a crash back to
    /// pending so the next drain picks them up. The interrupted dispatch may
    /// or may not have reached the backend, so a recovered action can be
    /// delivered twice. Returns the number of actions recovered.
    async fn recover_processing_actions(&self) -> Result<u64>;

    async fn put_cache_entry(&self, entry: &CacheEntry) -> Result<()>;
    async fn get_cache_entry(&self, key: &str) -> Result<Option<CacheEntry>>;
    async fn list_cache_entries_by_target(&self, target: &TableName) -> Result<Vec<CacheEntry>>;
    async fn delete_cache_entry(&self, key: &str) -> Result<bool>;
    async fn clear_cache(&self) -> Result<u64>;

    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;
}

use crate::application::ports::OfflineStore;
use crate::domain::entities::{CacheEntry, QueuedAction};
use crate::domain::value_objects::{ActionId, ActionStatus, TableName};
use crate::infrastructure::offline::rows::{CacheEntryRow, QueuedActionRow};
use crate::shared::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// SQLx-backed implementation of the offline store port. Each method is a
/// single statement, so atomicity comes from sqlite itself.
pub struct SqliteOfflineStore {
    pool: SqlitePool,
}

impl SqliteOfflineStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfflineStore for SqliteOfflineStore {
    async fn insert_action(&self, action: &QueuedAction) -> Result<()> {
        let payload = serde_json::to_string(&action.payload)?;

        sqlx::query(
            r#"
            INSERT INTO queued_actions (
                id, kind, target, record_id, payload, status,
                retry_count, max_retries, last_error, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(action.id.as_str())
        .bind(action.kind.as_str())
        .bind(action.target.as_str())
        .bind(&action.record_id)
        .bind(payload)
        .bind(action.status.as_str())
        .bind(action.retry_count as i64)
        .bind(action.max_retries as i64)
        .bind(&action.last_error)
        .bind(action.created_at.timestamp_millis())
        .bind(action.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_action(&self, id: &ActionId) -> Result<Option<QueuedAction>> {
        let row = sqlx::query_as::<_, QueuedActionRow>(
            "SELECT * FROM queued_actions WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(QueuedAction::try_from).transpose()
    }

    async fn list_actions_by_status(&self, status: ActionStatus) -> Result<Vec<QueuedAction>> {
        // rowid breaks created_at ties so insertion order survives bursts.
        let rows = sqlx::query_as::<_, QueuedActionRow>(
            r#"
            SELECT * FROM queued_actions
            WHERE status = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QueuedAction::try_from).collect()
    }

    async fn list_actions_by_target(&self, target: &TableName) -> Result<Vec<QueuedAction>> {
        let rows = sqlx::query_as::<_, QueuedActionRow>(
            r#"
            SELECT * FROM queued_actions
            WHERE target = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(target.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QueuedAction::try_from).collect()
    }

    async fn set_action_state(
        &self,
        id: &ActionId,
        status: ActionStatus,
        retry_count: u32,
        last_error: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE queued_actions
            SET status = ?1, retry_count = ?2, last_error = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(status.as_str())
        .bind(retry_count as i64)
        .bind(last_error)
        .bind(updated_at.timestamp_millis())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_actions_by_status(&self, status: ActionStatus) -> Result<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM queued_actions WHERE status = ?1")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    async fn delete_action(&self, id: &ActionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM queued_actions WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reset_failed_actions(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE queued_actions
            SET status = 'pending', updated_at = ?1
            WHERE status = 'failed'
            "#,
        )
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn recover_processing_actions(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE queued_actions
            SET status = 'pending', updated_at = ?1
            WHERE status = 'processing'
            "#,
        )
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn put_cache_entry(&self, entry: &CacheEntry) -> Result<()> {
        let data = serde_json::to_string(&entry.data)?;

        sqlx::query(
            r#"
            INSERT INTO cached_data (key, data, target, last_updated)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                data = excluded.data,
                target = excluded.target,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&entry.key)
        .bind(data)
        .bind(entry.target.as_str())
        .bind(entry.last_updated.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_cache_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query_as::<_, CacheEntryRow>("SELECT * FROM cached_data WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CacheEntry::try_from).transpose()
    }

    async fn list_cache_entries_by_target(&self, target: &TableName) -> Result<Vec<CacheEntry>> {
        let rows = sqlx::query_as::<_, CacheEntryRow>(
            "SELECT * FROM cached_data WHERE target = ?1 ORDER BY last_updated DESC",
        )
        .bind(target.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CacheEntry::try_from).collect()
    }

    async fn delete_cache_entry(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cached_data WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_cache(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cached_data")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }
}

use crate::domain::entities::{CacheEntry, QueuedAction};
use crate::domain::value_objects::{ActionId, ActionKind, ActionStatus, TableName};
use crate::shared::error::SyncError;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct QueuedActionRow {
    pub id: String,
    pub kind: String,
    pub target: String,
    pub record_id: Option<String>,
    pub payload: String,
    pub status: String,
    pub retry_count: i64,
    pub max_retries: i64,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CacheEntryRow {
    pub key: String,
    pub data: String,
    pub target: String,
    pub last_updated: i64,
}

fn timestamp_from_millis(millis: i64, column: &str) -> Result<DateTime<Utc>, SyncError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| SyncError::Database(format!("Invalid {column} timestamp: {millis}")))
}

impl TryFrom<QueuedActionRow> for QueuedAction {
    type Error = SyncError;

    fn try_from(row: QueuedActionRow) -> Result<Self, Self::Error> {
        Ok(QueuedAction {
            id: ActionId::new(row.id).map_err(SyncError::Database)?,
            kind: ActionKind::parse(&row.kind).map_err(SyncError::Database)?,
            target: TableName::new(row.target).map_err(SyncError::Database)?,
            record_id: row.record_id,
            payload: serde_json::from_str(&row.payload)?,
            status: ActionStatus::parse(&row.status).map_err(SyncError::Database)?,
            retry_count: u32::try_from(row.retry_count)
                .map_err(|e| SyncError::Database(e.to_string()))?,
            max_retries: u32::try_from(row.max_retries)
                .map_err(|e| SyncError::Database(e.to_string()))?,
            last_error: row.last_error,
            created_at: timestamp_from_millis(row.created_at, "created_at")?,
            updated_at: timestamp_from_millis(row.updated_at, "updated_at")?,
        })
    }
}

impl TryFrom<CacheEntryRow> for CacheEntry {
    type Error = SyncError;

    fn try_from(row: CacheEntryRow) -> Result<Self, Self::Error> {
        Ok(CacheEntry {
            key: row.key,
            data: serde_json::from_str(&row.data)?,
            target: TableName::new(row.target).map_err(SyncError::Database)?,
            last_updated: timestamp_from_millis(row.last_updated, "last_updated")?,
        })
    }
}

use crate::domain::value_objects::TableName;
use crate::shared::error::DispatchError;
use async_trait::async_trait;
use serde_json::Value;

/// The remote data backend that queued mutations are replayed against.
///
/// Transport-level failures (timeout, connection refused, 5xx) should be
/// reported as `DispatchError::Transient`; business rejections that will
/// never succeed on retry (validation, conflict) as `Permanent`.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn insert(
        &self,
        target: &TableName,
        payload: &Value,
    ) -> std::result::Result<Value, DispatchError>;

    async fn update(
        &self,
        target: &TableName,
        record_id: &str,
        payload: &Value,
    ) -> std::result::Result<(), DispatchError>;

    async fn delete(
        &self,
        target: &TableName,
        record_id: &str,
    ) -> std::result::Result<(), DispatchError>;
}

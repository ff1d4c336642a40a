use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Offline store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition for action {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for SyncError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        SyncError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Failure reported by the remote backend for a single dispatch.
///
/// `Transient` failures consume one retry per drain cycle; `Permanent`
/// rejections fail the action immediately without waiting out the retry
/// budget. Backends that cannot classify should report `Transient`.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Transient dispatch failure: {0}")]
    Transient(String),

    #[error("Permanent dispatch rejection: {0}")]
    Permanent(String),
}

impl DispatchError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, DispatchError::Permanent(_))
    }

    pub fn message(&self) -> &str {
        match self {
            DispatchError::Transient(msg) | DispatchError::Permanent(msg) => msg.as_str(),
        }
    }
}

use crate::shared::error::{Result, SyncError};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::Arc;

/// Thin wrapper around the shared sqlite pool, owning schema migration.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: Arc<SqlitePool>,
}

impl ConnectionPool {
    /// Connects and brings the schema up to date. Safe to call against an
    /// existing database: already-applied migrations are skipped, newer ones
    /// run in place without touching existing rows.
    pub async fn open(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| SyncError::StoreUnavailable(e.to_string()))?;

        let pool = Self {
            pool: Arc::new(pool),
        };
        pool.migrate().await?;
        Ok(pool)
    }

    /// In-memory database, used for tests and for degraded operation when
    /// the durable store cannot be opened. A single connection keeps every
    /// query on the same memory database.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open("sqlite::memory:", 1).await
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| SyncError::StoreUnavailable(e.to_string()))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

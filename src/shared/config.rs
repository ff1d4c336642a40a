use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Start the periodic heartbeat automatically on open.
    pub auto_sync: bool,
    /// Connectivity assumed until the first platform signal arrives.
    pub assume_online: bool,
    /// Fixed heartbeat interval driving drain cycles while online.
    pub heartbeat_interval_secs: u64,
    /// Per-dispatch timeout; an elapsed timeout counts as a transient failure.
    pub dispatch_timeout_secs: u64,
    /// Retry ceiling used when a caller does not supply one.
    pub default_max_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://frontdesk.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            assume_online: true,
            heartbeat_interval_secs: 30,
            dispatch_timeout_secs: 10,
            default_max_retries: 3,
        }
    }
}

//! Offline write-queue and synchronization engine for front-desk clients.
//!
//! Mutations (check-ins, check-outs, payments, maintenance requests) are
//! durably persisted before the caller is acknowledged, then replayed
//! against the remote backend once connectivity returns. Delivery is
//! at-least-once with bounded retries per action; lifecycle progress is
//! broadcast over a typed event bus.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

mod client;

pub use application::ports::{OfflineStore, RemoteBackend};
pub use application::services::{ActionQueue, CacheStore, EngineStatus, SyncEngine};
pub use client::OfflineClient;
pub use domain::entities::{
    ActionDraft, CacheEntry, QueueStats, QueuedAction, SyncFailure, SyncReport,
};
pub use domain::value_objects::{ActionId, ActionKind, ActionStatus, TableName};
pub use infrastructure::database::ConnectionPool;
pub use infrastructure::event::{EventBus, EventHandler, EventKind, SyncEvent};
pub use infrastructure::network::NetworkMonitor;
pub use infrastructure::offline::SqliteOfflineStore;
pub use shared::config::{AppConfig, DatabaseConfig, SyncConfig};
pub use shared::error::{DispatchError, Result, SyncError};

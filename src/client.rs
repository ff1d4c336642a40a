use crate::application::ports::{OfflineStore, RemoteBackend};
use crate::application::services::{ActionQueue, CacheStore, EngineStatus, SyncEngine};
use crate::domain::entities::{ActionDraft, CacheEntry, QueueStats, QueuedAction, SyncReport};
use crate::domain::value_objects::{ActionId, ActionKind, ActionStatus, TableName};
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::event::{EventBus, EventHandler, EventKind};
use crate::infrastructure::network::NetworkMonitor;
use crate::infrastructure::offline::SqliteOfflineStore;
use crate::shared::config::AppConfig;
use crate::shared::error::{Result, SyncError};
use serde_json::Value;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const CHECK_INS_TABLE: &str = "check_ins";
const CHECK_OUTS_TABLE: &str = "check_outs";
const PAYMENTS_TABLE: &str = "payments";
const MAINTENANCE_TABLE: &str = "maintenance_requests";

const OPERATIONAL_MAX_RETRIES: u32 = 3;
// Payment loss is costlier than a delayed UI refresh.
const PAYMENT_MAX_RETRIES: u32 = 5;

/// Entry point for front-desk callers: owns the durable store, the action
/// queue, the sync engine, the connectivity monitor, and the event bus, with
/// an explicit open/close lifecycle so isolated instances can run against
/// temporary storage.
pub struct OfflineClient {
    config: AppConfig,
    pool: ConnectionPool,
    queue: Arc<ActionQueue>,
    engine: Arc<SyncEngine>,
    cache: CacheStore,
    monitor: Arc<NetworkMonitor>,
    bus: Arc<EventBus>,
    store: Arc<dyn OfflineStore>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    degraded: Option<String>,
}

impl OfflineClient {
    /// Opens the durable store at the configured path. Fails with
    /// `StoreUnavailable` when local persistence cannot be opened; callers
    /// that want to keep operating anyway should use `open_or_degraded`.
    pub async fn open(config: AppConfig, backend: Arc<dyn RemoteBackend>) -> Result<Self> {
        let pool =
            ConnectionPool::open(&config.database.url, config.database.max_connections).await?;
        Self::assemble(config, pool, backend, None).await
    }

    /// Fully in-memory instance; state does not survive the process.
    pub async fn open_in_memory(
        config: AppConfig,
        backend: Arc<dyn RemoteBackend>,
    ) -> Result<Self> {
        let pool = ConnectionPool::open_in_memory().await?;
        Self::assemble(config, pool, backend, None).await
    }

    /// Opens the durable store, falling back to in-memory operation when it
    /// is unavailable (quota, corruption). The fallback keeps the client
    /// usable for the session; `degraded_reason` reports the capability loss
    /// so the caller can tell the user that offline durability is gone.
    pub async fn open_or_degraded(
        config: AppConfig,
        backend: Arc<dyn RemoteBackend>,
    ) -> Result<Self> {
        match ConnectionPool::open(&config.database.url, config.database.max_connections).await {
            Ok(pool) => Self::assemble(config, pool, backend, None).await,
            Err(SyncError::StoreUnavailable(reason)) => {
                warn!(
                    error = %reason,
                    "durable store unavailable; degrading to in-memory operation"
                );
                let pool = ConnectionPool::open_in_memory().await?;
                Self::assemble(config, pool, backend, Some(reason)).await
            }
            Err(e) => Err(e),
        }
    }

    async fn assemble(
        config: AppConfig,
        pool: ConnectionPool,
        backend: Arc<dyn RemoteBackend>,
        degraded: Option<String>,
    ) -> Result<Self> {
        let store: Arc<dyn OfflineStore> =
            Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));
        // A crash mid-dispatch leaves actions in `processing`; without this
        // sweep no drain would ever pick them up again. The interrupted
        // dispatch may already have landed, so delivery is at-least-once.
        let recovered = store.recover_processing_actions().await?;
        if recovered > 0 {
            info!(count = recovered, "recovered in-flight actions from previous session");
        }
        let bus = Arc::new(EventBus::new());
        let monitor = Arc::new(NetworkMonitor::new(bus.clone(), config.sync.assume_online));
        let queue = Arc::new(ActionQueue::new(store.clone(), bus.clone()));
        let engine = Arc::new(SyncEngine::new(
            queue.clone(),
            store.clone(),
            backend,
            monitor.clone(),
            bus.clone(),
            Duration::from_secs(config.sync.dispatch_timeout_secs),
        ));
        let cache = CacheStore::new(store.clone());

        let client = Self {
            config,
            pool,
            queue,
            engine,
            cache,
            monitor,
            bus,
            store,
            heartbeat: Mutex::new(None),
            degraded,
        };
        if client.config.sync.auto_sync {
            client.start_heartbeat();
        }
        Ok(client)
    }

    /// Stops the heartbeat and closes the store. Further calls fail with
    /// database errors; drop the client after closing.
    pub async fn close(&self) {
        if let Some(handle) = self.heartbeat.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
        self.pool.close().await;
        info!("offline client closed");
    }

    /// Durably records a mutation and returns its id. When online, a drain
    /// cycle is triggered in the background; the caller never waits on the
    /// network.
    pub async fn enqueue(&self, draft: ActionDraft) -> Result<ActionId> {
        let id = self.queue.enqueue(draft).await?;
        if self.monitor.is_online() {
            self.trigger_sync();
        }
        Ok(id)
    }

    /// Generic enqueue using the configured default retry budget.
    pub async fn enqueue_mutation(
        &self,
        kind: ActionKind,
        target: TableName,
        record_id: Option<String>,
        payload: Value,
    ) -> Result<ActionId> {
        self.enqueue(ActionDraft::new(
            kind,
            target,
            record_id,
            payload,
            self.config.sync.default_max_retries,
        ))
        .await
    }

    pub async fn check_in(&self, payload: Value) -> Result<ActionId> {
        self.enqueue(ActionDraft::new(
            ActionKind::Create,
            table(CHECK_INS_TABLE)?,
            None,
            payload,
            OPERATIONAL_MAX_RETRIES,
        ))
        .await
    }

    pub async fn check_out(&self, payload: Value) -> Result<ActionId> {
        self.enqueue(ActionDraft::new(
            ActionKind::Create,
            table(CHECK_OUTS_TABLE)?,
            None,
            payload,
            OPERATIONAL_MAX_RETRIES,
        ))
        .await
    }

    pub async fn record_payment(&self, payload: Value) -> Result<ActionId> {
        self.enqueue(ActionDraft::new(
            ActionKind::Create,
            table(PAYMENTS_TABLE)?,
            None,
            payload,
            PAYMENT_MAX_RETRIES,
        ))
        .await
    }

    pub async fn maintenance_request(&self, payload: Value) -> Result<ActionId> {
        self.enqueue(ActionDraft::new(
            ActionKind::Create,
            table(MAINTENANCE_TABLE)?,
            None,
            payload,
            OPERATIONAL_MAX_RETRIES,
        ))
        .await
    }

    pub async fn get_action(&self, id: &ActionId) -> Result<Option<QueuedAction>> {
        self.queue.get(id).await
    }

    pub async fn list_actions(&self, status: ActionStatus) -> Result<Vec<QueuedAction>> {
        self.queue.list_by_status(status).await
    }

    pub async fn stats(&self) -> Result<QueueStats> {
        Ok(QueueStats {
            pending_count: self.queue.pending_count().await?,
            failed_count: self.queue.failed_count().await?,
            is_online: self.monitor.is_online(),
            is_syncing: self.engine.is_syncing().await,
        })
    }

    pub async fn on(&self, kind: EventKind, handler: EventHandler) {
        self.bus.subscribe(kind, handler).await;
    }

    pub async fn off(&self, kind: EventKind, handler: &EventHandler) {
        self.bus.unsubscribe(kind, handler).await;
    }

    pub async fn cache_put(
        &self,
        key: impl Into<String>,
        data: Value,
        target: TableName,
    ) -> Result<()> {
        self.cache.put(key, data, target).await
    }

    pub async fn cache_get(&self, key: &str) -> Result<Option<CacheEntry>> {
        self.cache.get(key).await
    }

    pub async fn cache_clear(&self) -> Result<u64> {
        self.cache.clear().await
    }

    pub async fn setting_put(&self, key: &str, value: &str) -> Result<()> {
        self.store.put_setting(key, value).await
    }

    pub async fn setting_get(&self, key: &str) -> Result<Option<String>> {
        self.store.get_setting(key).await
    }

    /// Platform connectivity signal entry point. An offline-to-online
    /// transition immediately triggers a background drain.
    pub async fn set_connectivity(&self, online: bool) {
        let transitioned = self.monitor.set_online(online).await;
        if transitioned && online {
            self.trigger_sync();
        }
    }

    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Runs one drain cycle to completion and returns its report.
    pub async fn sync_now(&self) -> Result<SyncReport> {
        self.engine.sync_pending_actions().await
    }

    pub async fn engine_status(&self) -> EngineStatus {
        self.engine.status().await
    }

    /// Operator control: resets failed actions to pending for another round
    /// of drains. Retry counts are preserved.
    pub async fn retry_failed_actions(&self) -> Result<u64> {
        self.queue.retry_failed().await
    }

    /// Starts the periodic heartbeat if not already running.
    pub fn start_heartbeat(&self) {
        let mut slot = self.heartbeat.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return;
        }
        let interval = Duration::from_secs(self.config.sync.heartbeat_interval_secs);
        *slot = Some(self.engine.schedule_heartbeat(interval));
    }

    /// Set when the durable store could not be opened and the client fell
    /// back to in-memory operation.
    pub fn degraded_reason(&self) -> Option<&str> {
        self.degraded.as_deref()
    }

    pub fn queue(&self) -> &Arc<ActionQueue> {
        &self.queue
    }

    fn trigger_sync(&self) {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.sync_pending_actions().await {
                error!(error = %e, "background drain failed");
            }
        });
    }
}

fn table(name: &'static str) -> Result<TableName> {
    TableName::new(name).map_err(SyncError::Validation)
}

impl Drop for OfflineClient {
    fn drop(&mut self) {
        if let Some(handle) = self.heartbeat.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::DispatchError;
    use async_trait::async_trait;
    use serde_json::json;

    struct AlwaysUpBackend;

    #[async_trait]
    impl RemoteBackend for AlwaysUpBackend {
        async fn insert(
            &self,
            _target: &TableName,
            _payload: &Value,
        ) -> std::result::Result<Value, DispatchError> {
            Ok(json!({}))
        }

        async fn update(
            &self,
            _target: &TableName,
            _record_id: &str,
            _payload: &Value,
        ) -> std::result::Result<(), DispatchError> {
            Ok(())
        }

        async fn delete(
            &self,
            _target: &TableName,
            _record_id: &str,
        ) -> std::result::Result<(), DispatchError> {
            Ok(())
        }
    }

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.sync.auto_sync = false;
        config.sync.assume_online = false;
        config
    }

    async fn offline_client() -> OfflineClient {
        OfflineClient::open_in_memory(offline_config(), Arc::new(AlwaysUpBackend))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn convenience_wrappers_set_targets_and_budgets() {
        let client = offline_client().await;

        let check_in = client.check_in(json!({"guest": "g-1"})).await.unwrap();
        let payment = client
            .record_payment(json!({"amount": 120, "currency": "EUR"}))
            .await
            .unwrap();

        let check_in = client.get_action(&check_in).await.unwrap().unwrap();
        assert_eq!(check_in.target.as_str(), "check_ins");
        assert_eq!(check_in.max_retries, 3);

        let payment = client.get_action(&payment).await.unwrap().unwrap();
        assert_eq!(payment.target.as_str(), "payments");
        assert_eq!(payment.max_retries, 5);
    }

    #[tokio::test]
    async fn enqueue_mutation_uses_configured_default_budget() {
        let client = offline_client().await;
        let id = client
            .enqueue_mutation(
                ActionKind::Create,
                TableName::new("rooms").unwrap(),
                None,
                json!({"number": 204}),
            )
            .await
            .unwrap();

        let action = client.get_action(&id).await.unwrap().unwrap();
        assert_eq!(action.max_retries, 3);
        assert_eq!(action.target.as_str(), "rooms");
    }

    #[tokio::test]
    async fn stats_reflect_queue_and_connectivity() {
        let client = offline_client().await;
        client.check_in(json!({})).await.unwrap();

        let stats = client.stats().await.unwrap();
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.failed_count, 0);
        assert!(!stats.is_online);
        assert!(!stats.is_syncing);
    }

    #[tokio::test]
    async fn open_or_degraded_falls_back_to_memory() {
        let mut config = offline_config();
        config.database.url = "sqlite:///nonexistent-dir/x/y/z.db".to_string();

        let client = OfflineClient::open_or_degraded(config, Arc::new(AlwaysUpBackend))
            .await
            .unwrap();

        assert!(client.degraded_reason().is_some());
        // Still fully operational for the session.
        client.check_in(json!({})).await.unwrap();
        assert_eq!(client.stats().await.unwrap().pending_count, 1);
    }

    #[tokio::test]
    async fn open_propagates_store_unavailable() {
        let mut config = offline_config();
        config.database.url = "sqlite:///nonexistent-dir/x/y/z.db".to_string();

        let result = OfflineClient::open(config, Arc::new(AlwaysUpBackend)).await;
        assert!(matches!(result, Err(SyncError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn settings_survive_within_session() {
        let client = offline_client().await;
        client.setting_put("theme", "dark").await.unwrap();
        assert_eq!(
            client.setting_get("theme").await.unwrap().as_deref(),
            Some("dark")
        );
    }
}

use crate::application::ports::{OfflineStore, RemoteBackend};
use crate::application::services::queue_service::ActionQueue;
use crate::domain::entities::{QueuedAction, SyncReport};
use crate::domain::value_objects::{ActionKind, ActionStatus};
use crate::infrastructure::event::{EventBus, SyncEvent};
use crate::infrastructure::network::NetworkMonitor;
use crate::shared::error::{DispatchError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const LAST_SYNC_SETTING: &str = "sync.last_sync_at";

#[derive(Debug, Clone, Default)]
pub struct EngineStatus {
    pub is_syncing: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Drains the action queue against the remote backend.
///
/// One drain cycle runs at a time; a trigger arriving mid-cycle is coalesced
/// and anything enqueued meanwhile is picked up by the next cycle. Within a
/// cycle actions are dispatched strictly sequentially in fetch order, so two
/// mutations against the same record apply in enqueue order.
pub struct SyncEngine {
    queue: Arc<ActionQueue>,
    store: Arc<dyn OfflineStore>,
    backend: Arc<dyn RemoteBackend>,
    monitor: Arc<NetworkMonitor>,
    bus: Arc<EventBus>,
    dispatch_timeout: Duration,
    status: Arc<RwLock<EngineStatus>>,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<ActionQueue>,
        store: Arc<dyn OfflineStore>,
        backend: Arc<dyn RemoteBackend>,
        monitor: Arc<NetworkMonitor>,
        bus: Arc<EventBus>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            store,
            backend,
            monitor,
            bus,
            dispatch_timeout,
            status: Arc::new(RwLock::new(EngineStatus::default())),
        }
    }

    pub async fn is_syncing(&self) -> bool {
        self.status.read().await.is_syncing
    }

    pub async fn status(&self) -> EngineStatus {
        self.status.read().await.clone()
    }

    /// One drain cycle. Returns a skipped report when offline or when a
    /// cycle is already in flight.
    pub async fn sync_pending_actions(&self) -> Result<SyncReport> {
        {
            let mut status = self.status.write().await;
            if status.is_syncing || !self.monitor.is_online() {
                return Ok(SyncReport::skipped());
            }
            status.is_syncing = true;
        }

        self.bus.emit(SyncEvent::SyncStarted).await;
        let result = self.drain().await;

        let finished_at = Utc::now();
        {
            let mut status = self.status.write().await;
            status.is_syncing = false;
            status.last_sync_at = Some(finished_at);
        }

        let report = result?;
        if let Err(e) = self
            .store
            .put_setting(LAST_SYNC_SETTING, &finished_at.to_rfc3339())
            .await
        {
            warn!(error = %e, "could not persist last sync timestamp");
        }

        info!(
            processed = report.processed,
            failed = report.failed,
            "drain cycle finished"
        );
        self.bus.emit(SyncEvent::SyncCompleted(report.clone())).await;

        Ok(report)
    }

    async fn drain(&self) -> Result<SyncReport> {
        // Fetched once; actions enqueued after this point wait for the next
        // cycle. A store error here fails the cycle fast.
        let pending = self.queue.list_by_status(ActionStatus::Pending).await?;
        debug!(count = pending.len(), "draining pending actions");

        let mut report = SyncReport::default();
        for action in pending {
            let processing = match self
                .queue
                .update_status(&action.id, ActionStatus::Processing, None)
                .await
            {
                Ok(updated) => updated,
                Err(e) => {
                    // Should not happen for a freshly fetched pending action.
                    error!(id = %action.id, error = %e, "could not mark action processing");
                    report.record_failure(action.id.clone(), e.to_string());
                    continue;
                }
            };

            match self.dispatch(&processing).await {
                Ok(()) => {
                    self.queue
                        .update_status(&processing.id, ActionStatus::Completed, None)
                        .await?;
                    report.record_success();
                }
                Err(dispatch_error) => {
                    self.handle_dispatch_failure(processing, dispatch_error, &mut report)
                        .await?;
                }
            }
        }

        Ok(report)
    }

    async fn handle_dispatch_failure(
        &self,
        action: QueuedAction,
        dispatch_error: DispatchError,
        report: &mut SyncReport,
    ) -> Result<()> {
        let exhausted = action.on_last_attempt() || dispatch_error.is_permanent();
        let next_status = if exhausted {
            ActionStatus::Failed
        } else {
            ActionStatus::Pending
        };

        let updated = self
            .queue
            .update_status(&action.id, next_status, Some(dispatch_error.message()))
            .await?;
        report.record_failure(updated.id.clone(), dispatch_error.message().to_string());

        if exhausted {
            warn!(
                id = %updated.id,
                retries = updated.retry_count,
                error = %dispatch_error,
                "action exhausted its retry budget"
            );
            self.bus
                .emit(SyncEvent::ActionFailed {
                    action: updated,
                    error: dispatch_error.message().to_string(),
                })
                .await;
        } else {
            debug!(
                id = %updated.id,
                retries = updated.retry_count,
                error = %dispatch_error,
                "action will be retried on the next cycle"
            );
            self.bus
                .emit(SyncEvent::ActionRetried {
                    action: updated,
                    error: dispatch_error.message().to_string(),
                })
                .await;
        }

        Ok(())
    }

    async fn dispatch(&self, action: &QueuedAction) -> std::result::Result<(), DispatchError> {
        let call = async {
            match action.kind {
                ActionKind::Create => self
                    .backend
                    .insert(&action.target, &action.payload)
                    .await
                    .map(|_| ()),
                ActionKind::Update => {
                    let record_id = action.record_id.as_deref().ok_or_else(|| {
                        DispatchError::Permanent("update carries no record id".to_string())
                    })?;
                    self.backend
                        .update(&action.target, record_id, &action.payload)
                        .await
                }
                ActionKind::Delete => {
                    let record_id = action.record_id.as_deref().ok_or_else(|| {
                        DispatchError::Permanent("delete carries no record id".to_string())
                    })?;
                    self.backend.delete(&action.target, record_id).await
                }
            }
        };

        match tokio::time::timeout(self.dispatch_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Transient(format!(
                "dispatch timed out after {:?}",
                self.dispatch_timeout
            ))),
        }
    }

    /// Periodic heartbeat: attempts a drain whenever currently online, so
    /// queued actions are bounded-stale even if a connectivity transition
    /// event is missed.
    pub fn schedule_heartbeat(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = engine.sync_pending_actions().await {
                    error!(error = %e, "heartbeat drain failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ActionDraft;
    use crate::domain::value_objects::TableName;
    use crate::infrastructure::database::ConnectionPool;
    use crate::infrastructure::event::EventKind;
    use crate::infrastructure::offline::SqliteOfflineStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Insert(String),
        Update(String, String),
        Delete(String, String),
    }

    #[derive(Default)]
    struct ScriptedBackend {
        calls: Mutex<Vec<Call>>,
        failures_remaining: AtomicUsize,
        permanent: std::sync::atomic::AtomicBool,
        delay: Option<Duration>,
    }

    impl ScriptedBackend {
        fn failing(times: usize) -> Self {
            let backend = Self::default();
            backend.failures_remaining.store(times, Ordering::SeqCst);
            backend
        }

        fn rejecting() -> Self {
            let backend = Self::failing(usize::MAX);
            backend.permanent.store(true, Ordering::SeqCst);
            backend
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn run(&self, call: Call) -> std::result::Result<(), DispatchError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().push(call);

            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                if remaining != usize::MAX {
                    self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                }
                return if self.permanent.load(Ordering::SeqCst) {
                    Err(DispatchError::Permanent("validation rejected".to_string()))
                } else {
                    Err(DispatchError::Transient("backend unreachable".to_string()))
                };
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteBackend for ScriptedBackend {
        async fn insert(
            &self,
            target: &TableName,
            _payload: &Value,
        ) -> std::result::Result<Value, DispatchError> {
            self.run(Call::Insert(target.to_string())).await?;
            Ok(json!({"id": "remote-1"}))
        }

        async fn update(
            &self,
            target: &TableName,
            record_id: &str,
            _payload: &Value,
        ) -> std::result::Result<(), DispatchError> {
            self.run(Call::Update(target.to_string(), record_id.to_string()))
                .await
        }

        async fn delete(
            &self,
            target: &TableName,
            record_id: &str,
        ) -> std::result::Result<(), DispatchError> {
            self.run(Call::Delete(target.to_string(), record_id.to_string()))
                .await
        }
    }

    struct Harness {
        queue: Arc<ActionQueue>,
        engine: Arc<SyncEngine>,
        backend: Arc<ScriptedBackend>,
        bus: Arc<EventBus>,
        monitor: Arc<NetworkMonitor>,
    }

    async fn setup(backend: ScriptedBackend, online: bool) -> Harness {
        setup_with_timeout(backend, online, Duration::from_secs(5)).await
    }

    async fn setup_with_timeout(
        backend: ScriptedBackend,
        online: bool,
        dispatch_timeout: Duration,
    ) -> Harness {
        let pool = ConnectionPool::open_in_memory().await.unwrap();
        let store: Arc<dyn OfflineStore> =
            Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));
        let bus = Arc::new(EventBus::new());
        let monitor = Arc::new(NetworkMonitor::new(bus.clone(), online));
        let queue = Arc::new(ActionQueue::new(store.clone(), bus.clone()));
        let backend = Arc::new(backend);
        let engine = Arc::new(SyncEngine::new(
            queue.clone(),
            store,
            backend.clone(),
            monitor.clone(),
            bus.clone(),
            dispatch_timeout,
        ));
        Harness {
            queue,
            engine,
            backend,
            bus,
            monitor,
        }
    }

    fn create_draft(target: &str, max_retries: u32) -> ActionDraft {
        ActionDraft::new(
            ActionKind::Create,
            TableName::new(target).unwrap(),
            None,
            json!({"guest": "g-1"}),
            max_retries,
        )
    }

    fn update_draft(record_id: &str) -> ActionDraft {
        ActionDraft::new(
            ActionKind::Update,
            TableName::new("reservations").unwrap(),
            Some(record_id.to_string()),
            json!({"room": "204"}),
            3,
        )
    }

    #[tokio::test]
    async fn offline_drain_is_a_no_op() {
        let h = setup(ScriptedBackend::default(), false).await;
        h.queue.enqueue(create_draft("check_ins", 3)).await.unwrap();

        let report = h.engine.sync_pending_actions().await.unwrap();

        assert!(report.skipped);
        assert!(h.backend.calls().is_empty());
        assert_eq!(h.queue.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn drain_works_after_connectivity_returns() {
        let h = setup(ScriptedBackend::default(), false).await;
        h.queue.enqueue(create_draft("check_ins", 3)).await.unwrap();

        assert!(h.engine.sync_pending_actions().await.unwrap().skipped);

        h.monitor.set_online(true).await;
        let report = h.engine.sync_pending_actions().await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(h.queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn successful_drain_completes_actions() {
        let h = setup(ScriptedBackend::default(), true).await;
        h.queue.enqueue(create_draft("check_ins", 3)).await.unwrap();

        let report = h.engine.sync_pending_actions().await.unwrap();

        assert!(!report.skipped);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(h.queue.pending_count().await.unwrap(), 0);
        assert_eq!(h.backend.calls(), vec![Call::Insert("check_ins".to_string())]);
    }

    #[tokio::test]
    async fn transient_failure_returns_action_to_pending() {
        let h = setup(ScriptedBackend::failing(1), true).await;
        let id = h.queue.enqueue(create_draft("payments", 5)).await.unwrap();

        let report = h.engine.sync_pending_actions().await.unwrap();
        assert_eq!(report.failed, 1);

        let action = h.queue.get(&id).await.unwrap().unwrap();
        assert_eq!(action.status, ActionStatus::Pending);
        assert_eq!(action.retry_count, 1);
        assert_eq!(action.last_error.as_deref(), Some("backend unreachable"));

        // Next cycle succeeds.
        let report = h.engine.sync_pending_actions().await.unwrap();
        assert_eq!(report.processed, 1);
        let action = h.queue.get(&id).await.unwrap().unwrap();
        assert_eq!(action.status, ActionStatus::Completed);
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_marks_failed_once() {
        let h = setup(ScriptedBackend::failing(usize::MAX), true).await;
        let id = h.queue.enqueue(create_draft("payments", 5)).await.unwrap();

        let failed_events = Arc::new(AtomicUsize::new(0));
        let counter = failed_events.clone();
        h.bus
            .subscribe(
                EventKind::ActionFailed,
                Arc::new(move |_event| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;

        for _ in 0..5 {
            h.engine.sync_pending_actions().await.unwrap();
        }

        let action = h.queue.get(&id).await.unwrap().unwrap();
        assert_eq!(action.status, ActionStatus::Failed);
        assert_eq!(action.retry_count, 5);
        assert_eq!(failed_events.load(Ordering::SeqCst), 1);

        // Terminal: further cycles never touch it.
        let before = h.backend.calls().len();
        h.engine.sync_pending_actions().await.unwrap();
        assert_eq!(h.backend.calls().len(), before);
    }

    #[tokio::test]
    async fn permanent_rejection_fails_fast() {
        let h = setup(ScriptedBackend::rejecting(), true).await;
        let id = h.queue.enqueue(create_draft("check_ins", 5)).await.unwrap();

        h.engine.sync_pending_actions().await.unwrap();

        let action = h.queue.get(&id).await.unwrap().unwrap();
        assert_eq!(action.status, ActionStatus::Failed);
        assert_eq!(action.retry_count, 1);
        assert_eq!(action.last_error.as_deref(), Some("validation rejected"));
    }

    #[tokio::test]
    async fn same_record_updates_dispatch_in_enqueue_order() {
        let h = setup(ScriptedBackend::default(), true).await;
        h.queue.enqueue(update_draft("r-1")).await.unwrap();
        h.queue.enqueue(update_draft("r-1")).await.unwrap();

        let report = h.engine.sync_pending_actions().await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(
            h.backend.calls(),
            vec![
                Call::Update("reservations".to_string(), "r-1".to_string()),
                Call::Update("reservations".to_string(), "r-1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_drains_coalesce_to_one_cycle() {
        let h = setup(ScriptedBackend::slow(Duration::from_millis(100)), true).await;
        h.queue.enqueue(create_draft("check_ins", 3)).await.unwrap();

        let first = tokio::spawn({
            let engine = h.engine.clone();
            async move { engine.sync_pending_actions().await.unwrap() }
        });
        // Give the first cycle time to take the flag and park in dispatch.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(h.engine.is_syncing().await);

        let second = h.engine.sync_pending_actions().await.unwrap();
        assert!(second.skipped);

        let first = first.await.unwrap();
        assert_eq!(first.processed, 1);
        assert_eq!(h.backend.calls().len(), 1);
        assert!(!h.engine.is_syncing().await);
    }

    #[tokio::test]
    async fn dispatch_timeout_counts_as_transient_failure() {
        let h = setup_with_timeout(
            ScriptedBackend::slow(Duration::from_secs(60)),
            true,
            Duration::from_millis(50),
        )
        .await;

        let id = h.queue.enqueue(create_draft("check_ins", 3)).await.unwrap();
        let report = h.engine.sync_pending_actions().await.unwrap();

        assert_eq!(report.failed, 1);
        let action = h.queue.get(&id).await.unwrap().unwrap();
        assert_eq!(action.status, ActionStatus::Pending);
        assert!(action
            .last_error
            .as_deref()
            .unwrap()
            .contains("timed out"));
    }

    #[tokio::test]
    async fn drain_persists_last_sync_setting() {
        let h = setup(ScriptedBackend::default(), true).await;
        h.engine.sync_pending_actions().await.unwrap();

        let status = h.engine.status().await;
        assert!(status.last_sync_at.is_some());
    }
}

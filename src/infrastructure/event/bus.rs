use crate::domain::entities::{QueuedAction, SyncReport};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Queue and sync lifecycle events broadcast to observers.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    ActionQueued(QueuedAction),
    ActionRetried { action: QueuedAction, error: String },
    ActionFailed { action: QueuedAction, error: String },
    ConnectionChanged { is_online: bool },
    SyncStarted,
    SyncCompleted(SyncReport),
}

impl SyncEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SyncEvent::ActionQueued(_) => EventKind::ActionQueued,
            SyncEvent::ActionRetried { .. } => EventKind::ActionRetried,
            SyncEvent::ActionFailed { .. } => EventKind::ActionFailed,
            SyncEvent::ConnectionChanged { .. } => EventKind::ConnectionChanged,
            SyncEvent::SyncStarted => EventKind::SyncStarted,
            SyncEvent::SyncCompleted(_) => EventKind::SyncCompleted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ActionQueued,
    ActionRetried,
    ActionFailed,
    ConnectionChanged,
    SyncStarted,
    SyncCompleted,
}

pub type EventHandler = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// In-process publish/subscribe for sync observers.
///
/// Registration is idempotent per (kind, handler): subscribing the same
/// handler twice delivers once. Delivery is synchronous and best-effort; a
/// panicking handler is logged and skipped without aborting the emit.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<EventHandler>>>,
}

fn handler_ptr(handler: &EventHandler) -> *const () {
    Arc::as_ptr(handler) as *const ()
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, kind: EventKind, handler: EventHandler) {
        let mut handlers = self.handlers.write().await;
        let entry = handlers.entry(kind).or_default();
        if entry.iter().any(|h| handler_ptr(h) == handler_ptr(&handler)) {
            return;
        }
        entry.push(handler);
    }

    pub async fn unsubscribe(&self, kind: EventKind, handler: &EventHandler) {
        let mut handlers = self.handlers.write().await;
        if let Some(entry) = handlers.get_mut(&kind) {
            entry.retain(|h| handler_ptr(h) != handler_ptr(handler));
        }
    }

    pub async fn emit(&self, event: SyncEvent) {
        let registered = {
            let handlers = self.handlers.read().await;
            handlers.get(&event.kind()).cloned().unwrap_or_default()
        };

        for handler in registered {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                warn!(kind = ?event.kind(), "event handler panicked; continuing delivery");
            }
        }
    }

    pub async fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .await
            .get(&kind)
            .map_or(0, |entry| entry.len())
    }
}

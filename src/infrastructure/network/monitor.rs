use crate::infrastructure::event::{EventBus, SyncEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Last-known connectivity state.
///
/// The monitor never probes the network itself; the embedding client feeds
/// platform online/offline signals into `set_online`, and actual
/// reachability is proven (or not) by the sync engine's backend calls.
pub struct NetworkMonitor {
    online: AtomicBool,
    bus: Arc<EventBus>,
}

impl NetworkMonitor {
    pub fn new(bus: Arc<EventBus>, initially_online: bool) -> Self {
        Self {
            online: AtomicBool::new(initially_online),
            bus,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Records a connectivity signal. Returns true when the state actually
    /// transitioned; a `ConnectionChanged` event is emitted only then.
    pub async fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }

        info!(is_online = online, "connectivity changed");
        self.bus
            .emit(SyncEvent::ConnectionChanged { is_online: online })
            .await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::event::{EventHandler, EventKind};
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn reports_transitions_only() {
        let bus = Arc::new(EventBus::new());
        let monitor = NetworkMonitor::new(bus.clone(), false);

        let transitions = Arc::new(AtomicUsize::new(0));
        let seen = transitions.clone();
        let handler: EventHandler = Arc::new(move |_event| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        bus.subscribe(EventKind::ConnectionChanged, handler).await;

        assert!(!monitor.is_online());
        assert!(monitor.set_online(true).await);
        assert!(monitor.is_online());

        // Repeated signal with no transition stays silent.
        assert!(!monitor.set_online(true).await);
        assert!(monitor.set_online(false).await);
        assert_eq!(transitions.load(Ordering::SeqCst), 2);
    }
}

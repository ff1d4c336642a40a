use crate::application::ports::OfflineStore;
use crate::domain::entities::{ActionDraft, QueuedAction};
use crate::domain::value_objects::{ActionId, ActionStatus, TableName};
use crate::infrastructure::event::{EventBus, SyncEvent};
use crate::shared::error::{Result, SyncError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Durable registry of pending mutations.
///
/// `enqueue` returns only after the insert has committed, so a caller
/// holding an id has a durability guarantee across process crashes.
/// `update_status` is the sole state-mutation entry point and enforces the
/// lifecycle: terminal actions never transition again.
pub struct ActionQueue {
    store: Arc<dyn OfflineStore>,
    bus: Arc<EventBus>,
}

impl ActionQueue {
    pub fn new(store: Arc<dyn OfflineStore>, bus: Arc<EventBus>) -> Self {
        Self { store, bus }
    }

    pub async fn enqueue(&self, draft: ActionDraft) -> Result<ActionId> {
        if draft.max_retries == 0 {
            return Err(SyncError::Validation(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if draft.kind.requires_record_id() && draft.record_id.is_none() {
            return Err(SyncError::Validation(format!(
                "{} against {} requires a record id",
                draft.kind, draft.target
            )));
        }

        let action = QueuedAction::from_draft(draft, Utc::now());
        self.store.insert_action(&action).await?;

        debug!(
            id = %action.id,
            kind = %action.kind,
            target = %action.target,
            "action queued"
        );
        self.bus.emit(SyncEvent::ActionQueued(action.clone())).await;

        Ok(action.id)
    }

    pub async fn get(&self, id: &ActionId) -> Result<Option<QueuedAction>> {
        self.store.get_action(id).await
    }

    pub async fn list_by_status(&self, status: ActionStatus) -> Result<Vec<QueuedAction>> {
        self.store.list_actions_by_status(status).await
    }

    pub async fn list_by_target(&self, target: &TableName) -> Result<Vec<QueuedAction>> {
        self.store.list_actions_by_target(target).await
    }

    /// Moves an action to `new_status`, rejecting illegal transitions.
    ///
    /// A failed attempt is the `Processing -> Pending` or `Processing ->
    /// Failed` edge; only there is `retry_count` incremented, clamped at
    /// `max_retries`. `error`, when given, replaces `last_error`; `None`
    /// preserves the previous one.
    pub async fn update_status(
        &self,
        id: &ActionId,
        new_status: ActionStatus,
        error: Option<&str>,
    ) -> Result<QueuedAction> {
        let mut action = self
            .store
            .get_action(id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("action {id}")))?;

        if !action.status.can_transition_to(new_status) {
            return Err(SyncError::InvalidTransition {
                id: id.to_string(),
                from: action.status.to_string(),
                to: new_status.to_string(),
            });
        }

        let attempt_failed = action.status == ActionStatus::Processing
            && matches!(new_status, ActionStatus::Pending | ActionStatus::Failed);
        if attempt_failed {
            action.retry_count = (action.retry_count + 1).min(action.max_retries);
        }
        if let Some(message) = error {
            action.last_error = Some(message.to_string());
        }
        action.status = new_status;
        action.updated_at = Utc::now();

        self.store
            .set_action_state(
                id,
                action.status,
                action.retry_count,
                action.last_error.as_deref(),
                action.updated_at,
            )
            .await?;

        Ok(action)
    }

    /// Retention sweep entry point; the engine itself never deletes.
    pub async fn remove(&self, id: &ActionId) -> Result<bool> {
        self.store.delete_action(id).await
    }

    /// Operator-facing recovery: every failed action back to pending with
    /// its retry count untouched. Deliberately not routed through
    /// `update_status`, which treats failed as terminal.
    pub async fn retry_failed(&self) -> Result<u64> {
        let reset = self.store.reset_failed_actions().await?;
        if reset > 0 {
            info!(count = reset, "failed actions reset to pending by operator");
        }
        Ok(reset)
    }

    pub async fn pending_count(&self) -> Result<u64> {
        self.store.count_actions_by_status(ActionStatus::Pending).await
    }

    pub async fn failed_count(&self) -> Result<u64> {
        self.store.count_actions_by_status(ActionStatus::Failed).await
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a queued action.
///
/// Legal transitions: `Pending -> Processing`, `Processing -> Completed`,
/// `Processing -> Failed`, `Processing -> Pending` (retry). `Completed` and
/// `Failed` are terminal and never transition automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Processing => "processing",
            ActionStatus::Completed => "completed",
            ActionStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(ActionStatus::Pending),
            "processing" => Ok(ActionStatus::Processing),
            "completed" => Ok(ActionStatus::Completed),
            "failed" => Ok(ActionStatus::Failed),
            other => Err(format!("Unknown action status: {other}")),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ActionStatus) -> bool {
        match self {
            ActionStatus::Pending => matches!(next, ActionStatus::Processing),
            ActionStatus::Processing => matches!(
                next,
                ActionStatus::Completed | ActionStatus::Failed | ActionStatus::Pending
            ),
            ActionStatus::Completed | ActionStatus::Failed => false,
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_never_transition() {
        for terminal in [ActionStatus::Completed, ActionStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                ActionStatus::Pending,
                ActionStatus::Processing,
                ActionStatus::Completed,
                ActionStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn processing_may_retry_complete_or_fail() {
        assert!(ActionStatus::Processing.can_transition_to(ActionStatus::Pending));
        assert!(ActionStatus::Processing.can_transition_to(ActionStatus::Completed));
        assert!(ActionStatus::Processing.can_transition_to(ActionStatus::Failed));
        assert!(!ActionStatus::Processing.can_transition_to(ActionStatus::Processing));
    }

    #[test]
    fn pending_only_moves_to_processing() {
        assert!(ActionStatus::Pending.can_transition_to(ActionStatus::Processing));
        assert!(!ActionStatus::Pending.can_transition_to(ActionStatus::Completed));
        assert!(!ActionStatus::Pending.can_transition_to(ActionStatus::Failed));
    }

    #[test]
    fn parses_known_values() {
        assert_eq!(
            ActionStatus::parse("pending").unwrap(),
            ActionStatus::Pending
        );
        assert!(ActionStatus::parse("stuck").is_err());
    }
}

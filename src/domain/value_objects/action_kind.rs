use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutation kind carried by a queued action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
        }
    }

    /// Update and delete address an existing remote record.
    pub fn requires_record_id(&self) -> bool {
        matches!(self, ActionKind::Update | ActionKind::Delete)
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "create" => Ok(ActionKind::Create),
            "update" => Ok(ActionKind::Update),
            "delete" => Ok(ActionKind::Delete),
            other => Err(format!("Unknown action kind: {other}")),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for kind in [ActionKind::Create, ActionKind::Update, ActionKind::Delete] {
            assert_eq!(ActionKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn only_create_skips_record_id() {
        assert!(!ActionKind::Create.requires_record_id());
        assert!(ActionKind::Update.requires_record_id());
        assert!(ActionKind::Delete.requires_record_id());
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(ActionKind::parse("upsert").is_err());
    }
}

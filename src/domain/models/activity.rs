//! Activity-log entries recorded on task terminal events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Action recorded by an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    TaskCompleted,
    TaskFailed,
    TaskTimeout,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCompleted => "task_completed",
            Self::TaskFailed => "task_failed",
            Self::TaskTimeout => "task_timeout",
        }
    }
}

/// One append-only activity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub agent_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub action: ActivityAction,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    /// Create an entry for a task-level action.
    pub fn for_task(
        task_id: Uuid,
        agent_id: Option<Uuid>,
        project_id: Option<Uuid>,
        action: ActivityAction,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            project_id,
            task_id: Some(task_id),
            action,
            details,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_as_str() {
        assert_eq!(ActivityAction::TaskCompleted.as_str(), "task_completed");
        assert_eq!(ActivityAction::TaskFailed.as_str(), "task_failed");
        assert_eq!(ActivityAction::TaskTimeout.as_str(), "task_timeout");
    }

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&ActivityAction::TaskTimeout).unwrap();
        assert_eq!(json, "\"task_timeout\"");
    }
}

//! Outbound notifications broadcast to connected listeners.
//!
//! The wire shape matches what dashboard clients consume: an `event` tag and
//! a JSON `data` payload.

use crate::domain::models::agent::AgentStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One broadcast notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Notification {
    /// Incremental worker output for a running task.
    TaskProgress {
        task_id: Uuid,
        agent_id: Option<Uuid>,
        chunk: String,
    },
    /// Task reached a clean terminal state.
    TaskCompleted {
        task_id: Uuid,
        agent_id: Option<Uuid>,
        output: String,
    },
    /// Task failed or timed out.
    TaskFailed {
        task_id: Uuid,
        agent_id: Option<Uuid>,
        error: String,
    },
    /// Agent status changed as a side effect of a task terminal event.
    AgentStatus {
        agent_id: Uuid,
        status: AgentStatus,
        task_id: Option<Uuid>,
    },
}

impl Notification {
    /// The event name listeners subscribe on.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::TaskProgress { .. } => "task_progress",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
            Self::AgentStatus { .. } => "agent_status",
        }
    }
}

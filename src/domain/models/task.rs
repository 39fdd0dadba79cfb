//! Task domain model.
//!
//! Tasks are discrete units of work executed by an external worker process.
//! The pool guarantees at most one live worker per task id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Status of a task in the execution pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is defined but has not been handed to the pool
    #[default]
    Pending,
    /// Task has a live (or queued) worker
    Running,
    /// Worker exited cleanly; output recorded
    Completed,
    /// Worker failed or timed out; error recorded
    Failed,
    /// Task was cancelled before reaching a terminal event
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "complete" | "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "canceled" | "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Task entity: one unit of work routed through the process pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: Uuid,

    /// Short human-readable title; first line of the worker prompt
    pub title: String,

    /// Longer free-form description appended to the prompt
    pub description: Option<String>,

    /// Structured input payload passed to the worker as context
    pub input: Option<serde_json::Value>,

    /// Agent assigned to the task; drives resource-tier selection
    pub agent_id: Option<Uuid>,

    /// Project the task belongs to (activity-log attribution only)
    pub project_id: Option<Uuid>,

    /// Current status
    pub status: TaskStatus,

    /// Worker output, recorded on completion
    pub output: Option<serde_json::Value>,

    /// Error payload, recorded on failure or timeout
    pub error: Option<serde_json::Value>,

    /// Working directory for the worker process
    pub working_dir: Option<PathBuf>,

    /// Per-task deadline override in milliseconds
    pub timeout_ms: Option<u64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Timestamp of the terminal event, if one has occurred
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            input: None,
            agent_id: None,
            project_id: None,
            status: TaskStatus::Pending,
            output: None,
            error: None,
            working_dir: None,
            timeout_ms: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Assemble the worker prompt from title, description, and input payload.
    pub fn prompt(&self) -> String {
        let mut prompt = self.title.clone();
        if let Some(ref description) = self.description {
            prompt.push('\n');
            prompt.push_str(description);
        }
        if let Some(ref input) = self.input {
            prompt.push_str("\nInput context:\n");
            prompt.push_str(&input.to_string());
        }
        prompt
    }
}

/// Partial update applied to a persisted task record.
///
/// The coordinator mutates task records only on terminal events, so the patch
/// surface is deliberately narrow: status, result payloads, and the
/// completion timestamp.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub output: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Patch for a task whose worker exited cleanly.
    pub fn completed(output: String) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            output: Some(serde_json::json!({ "output": output })),
            error: None,
            completed_at: Some(Utc::now()),
        }
    }

    /// Patch for a task whose worker failed or timed out.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            output: None,
            error: Some(serde_json::json!({ "error": message.into() })),
            completed_at: Some(Utc::now()),
        }
    }

    /// Apply the patch to a task record in place.
    pub fn apply(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(ref output) = self.output {
            task.output = Some(output.clone());
        }
        if let Some(ref error) = self.error {
            task.error = Some(error.clone());
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = Some(completed_at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_str("complete"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::from_str("canceled"), Some(TaskStatus::Cancelled));
        assert_eq!(TaskStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_prompt_title_only() {
        let task = Task::new("Review the parser");
        assert_eq!(task.prompt(), "Review the parser");
    }

    #[test]
    fn test_prompt_includes_description_and_input() {
        let mut task = Task::new("Review the parser");
        task.description = Some("Focus on error recovery".to_string());
        task.input = Some(serde_json::json!({ "files": ["parser.rs"] }));

        let prompt = task.prompt();
        assert!(prompt.starts_with("Review the parser\nFocus on error recovery"));
        assert!(prompt.contains("Input context:"));
        assert!(prompt.contains("parser.rs"));
    }

    #[test]
    fn test_patch_completed() {
        let mut task = Task::new("t");
        task.status = TaskStatus::Running;

        TaskPatch::completed("done".to_string()).apply(&mut task);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.output, Some(serde_json::json!({ "output": "done" })));
        assert!(task.completed_at.is_some());
        assert!(task.error.is_none());
    }

    #[test]
    fn test_patch_failed() {
        let mut task = Task::new("t");

        TaskPatch::failed("worker exited with code 2").apply(&mut task);
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(
            task.error,
            Some(serde_json::json!({ "error": "worker exited with code 2" }))
        );
        assert!(task.completed_at.is_some());
    }
}

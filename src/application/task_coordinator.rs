//! Task execution coordinator: the public entry point that binds persisted
//! task records to the process pool and performs all side-effecting state
//! transitions on terminal events.

use crate::application::process_pool::{ProcessPool, SpawnOutcome, WorkerEventHandler};
use crate::domain::error::ExecutionError;
use crate::domain::models::{
    ActivityAction, ActivityEntry, AgentStatus, Notification, ResourceTier, TaskPatch,
};
use crate::domain::ports::{ActivityLog, AgentStore, Notifier, TaskStore, WorkerError, WorkerSpec};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Activity-log details keep at most this much worker output.
const ACTIVITY_OUTPUT_LIMIT: usize = 500;

/// Snapshot of pool occupancy for health reporting.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    pub active: Vec<Uuid>,
    pub queue_length: usize,
}

/// Coordinates task execution through the process pool.
///
/// All collaborators are injected at construction so tests (and alternate
/// frontends) can substitute fakes; there is no global registry.
pub struct TaskCoordinator {
    pool: ProcessPool,
    tasks: Arc<dyn TaskStore>,
    agents: Arc<dyn AgentStore>,
    activity: Arc<dyn ActivityLog>,
    notifier: Arc<dyn Notifier>,
}

impl TaskCoordinator {
    pub fn new(
        pool: ProcessPool,
        tasks: Arc<dyn TaskStore>,
        agents: Arc<dyn AgentStore>,
        activity: Arc<dyn ActivityLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            pool,
            tasks,
            agents,
            activity,
            notifier,
        }
    }

    /// Execute a persisted task through the pool.
    ///
    /// Returns as soon as the task is admitted or queued; completion is
    /// reported through the store, the activity log, and notifications.
    /// Fails synchronously only when the task record does not exist.
    #[instrument(skip(self), fields(task_id = %task_id))]
    pub async fn execute_task(&self, task_id: Uuid) -> Result<SpawnOutcome, ExecutionError> {
        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(ExecutionError::TaskNotFound(task_id))?;

        let tier = match task.agent_id {
            Some(agent_id) => self
                .agents
                .get(agent_id)
                .await?
                .map_or_else(ResourceTier::default, |agent| agent.tier),
            None => ResourceTier::default(),
        };

        let spec = WorkerSpec {
            prompt: task.prompt(),
            tier,
            working_dir: task.working_dir.clone(),
            timeout: task.timeout_ms.map(Duration::from_millis),
        };

        let relay = Arc::new(CallbackRelay {
            task_id,
            agent_id: task.agent_id,
            project_id: task.project_id,
            tasks: Arc::clone(&self.tasks),
            agents: Arc::clone(&self.agents),
            activity: Arc::clone(&self.activity),
            notifier: Arc::clone(&self.notifier),
        });

        let outcome = self.pool.spawn(task_id, spec, relay);
        info!(
            queued = outcome.queued,
            position = outcome.position,
            tier = %tier,
            "task handed to pool"
        );
        Ok(outcome)
    }

    /// Cancel a task's pending or running worker.
    ///
    /// Persisted task state is intentionally left untouched: the caller owns
    /// reconciliation of cancelled work, and suppression in the pool
    /// guarantees no spurious `failed` status arrives afterwards.
    pub fn cancel_task(&self, task_id: Uuid) {
        info!(%task_id, "cancel requested");
        self.pool.cancel(task_id);
    }

    /// Current pool occupancy, for health reporting.
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            active: self.pool.active(),
            queue_length: self.pool.queue_len(),
        }
    }

    /// Process-wide shutdown: cancel everything, best-effort.
    pub fn shutdown(&self) {
        info!("coordinator shutdown");
        self.pool.cancel_all();
    }
}

/// Bridges one launch's worker events to store mutations, activity-log
/// appends, and outbound notifications.
///
/// Persistence failures inside callbacks are logged and swallowed: by the
/// time a terminal event arrives nobody is synchronously waiting, so there
/// is no caller to propagate to.
struct CallbackRelay {
    task_id: Uuid,
    agent_id: Option<Uuid>,
    project_id: Option<Uuid>,
    tasks: Arc<dyn TaskStore>,
    agents: Arc<dyn AgentStore>,
    activity: Arc<dyn ActivityLog>,
    notifier: Arc<dyn Notifier>,
}

impl CallbackRelay {
    async fn finalize(
        &self,
        patch: TaskPatch,
        agent_status: AgentStatus,
        action: ActivityAction,
        details: serde_json::Value,
    ) {
        if let Err(err) = self.tasks.update(self.task_id, patch).await {
            error!(task_id = %self.task_id, %err, "failed to persist task terminal state");
        }

        if let Some(agent_id) = self.agent_id {
            if let Err(err) = self.agents.update_status(agent_id, agent_status).await {
                error!(%agent_id, %err, "failed to persist agent status");
            }
        }

        let entry = ActivityEntry::for_task(
            self.task_id,
            self.agent_id,
            self.project_id,
            action,
            details,
        );
        if let Err(err) = self.activity.append(entry).await {
            warn!(task_id = %self.task_id, %err, "failed to append activity entry");
        }
    }

    fn publish_agent_status(&self, status: AgentStatus) {
        if let Some(agent_id) = self.agent_id {
            self.notifier.publish(Notification::AgentStatus {
                agent_id,
                status,
                task_id: Some(self.task_id),
            });
        }
    }

    async fn fail_with(&self, message: String, action: ActivityAction) {
        self.finalize(
            TaskPatch::failed(message.clone()),
            AgentStatus::Failed,
            action,
            serde_json::json!({ "error": message }),
        )
        .await;

        self.notifier.publish(Notification::TaskFailed {
            task_id: self.task_id,
            agent_id: self.agent_id,
            error: message,
        });
        self.publish_agent_status(AgentStatus::Failed);
    }
}

#[async_trait]
impl WorkerEventHandler for CallbackRelay {
    async fn on_data(&self, chunk: String) {
        self.notifier.publish(Notification::TaskProgress {
            task_id: self.task_id,
            agent_id: self.agent_id,
            chunk,
        });
    }

    async fn on_complete(&self, output: String) {
        let excerpt: String = output.chars().take(ACTIVITY_OUTPUT_LIMIT).collect();
        self.finalize(
            TaskPatch::completed(output.clone()),
            AgentStatus::Idle,
            ActivityAction::TaskCompleted,
            serde_json::json!({ "output": excerpt }),
        )
        .await;

        self.notifier.publish(Notification::TaskCompleted {
            task_id: self.task_id,
            agent_id: self.agent_id,
            output,
        });
        self.publish_agent_status(AgentStatus::Idle);
    }

    async fn on_error(&self, error: WorkerError) {
        self.fail_with(error.to_string(), ActivityAction::TaskFailed)
            .await;
    }

    async fn on_timeout(&self) {
        self.fail_with("Task timed out".to_string(), ActivityAction::TaskTimeout)
            .await;
    }
}

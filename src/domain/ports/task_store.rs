use crate::domain::models::{Task, TaskPatch};
use crate::domain::ports::errors::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository port for task record persistence.
///
/// The execution core reads a task once per launch and writes only on
/// terminal events; everything else about task storage belongs to the
/// surrounding application.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task record
    async fn insert(&self, task: &Task) -> Result<(), StoreError>;

    /// Get a task by ID
    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Apply a partial update to an existing task
    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<(), StoreError>;
}

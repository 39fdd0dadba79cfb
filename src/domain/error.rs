use thiserror::Error;
use uuid::Uuid;

use super::ports::errors::StoreError;

/// Errors surfaced synchronously by the task execution coordinator.
///
/// Everything that happens after admission is delivered through callbacks,
/// never as an error from `execute_task` itself.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

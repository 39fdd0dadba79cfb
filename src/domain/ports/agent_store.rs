use crate::domain::models::{Agent, AgentStatus};
use crate::domain::ports::errors::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository port for agent record persistence.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Insert a new agent record
    async fn insert(&self, agent: &Agent) -> Result<(), StoreError>;

    /// Get an agent by ID
    async fn get(&self, id: Uuid) -> Result<Option<Agent>, StoreError>;

    /// Update an agent's status and `updated_at` timestamp.
    ///
    /// Updating an unknown agent is a successful no-op, matching an UPDATE
    /// that affects zero rows.
    async fn update_status(&self, id: Uuid, status: AgentStatus) -> Result<(), StoreError>;
}

//! In-memory task and agent stores.
//!
//! Used by the binary and tests; production deployments supply their own
//! store adapters behind the same ports.

use crate::domain::models::{Agent, AgentStatus, Task, TaskPatch};
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::{AgentStore, TaskStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of [`TaskStore`] and [`AgentStore`].
#[derive(Default)]
pub struct InMemoryStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
    agents: RwLock<HashMap<Uuid, Agent>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        patch.apply(task);
        Ok(())
    }
}

#[async_trait]
impl AgentStore for InMemoryStore {
    async fn insert(&self, agent: &Agent) -> Result<(), StoreError> {
        self.agents.write().await.insert(agent.id, agent.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Agent>, StoreError> {
        Ok(self.agents.read().await.get(&id).cloned())
    }

    async fn update_status(&self, id: Uuid, status: AgentStatus) -> Result<(), StoreError> {
        // Unknown agent is a no-op, like an UPDATE matching zero rows.
        if let Some(agent) = self.agents.write().await.get_mut(&id) {
            agent.status = status;
            agent.updated_at = Utc::now();
        }
        Ok(())
    }
}

//! In-memory activity log.

use crate::domain::models::ActivityEntry;
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::ActivityLog;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Append-only in-memory [`ActivityLog`].
#[derive(Default)]
pub struct InMemoryActivityLog {
    entries: RwLock<Vec<ActivityEntry>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, in append order.
    pub async fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn append(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

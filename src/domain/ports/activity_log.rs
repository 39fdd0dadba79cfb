use crate::domain::models::ActivityEntry;
use crate::domain::ports::errors::StoreError;
use async_trait::async_trait;

/// Append-only activity log sink.
///
/// Callers treat appends as fire-and-forget: a failed append is logged and
/// never fails the surrounding task transition.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, entry: ActivityEntry) -> Result<(), StoreError>;
}

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by store adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Store backend error: {0}")]
    Backend(String),
}

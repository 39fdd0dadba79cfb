//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces that infrastructure adapters implement:
//! - `TaskStore` / `AgentStore`: record persistence
//! - `ActivityLog`: append-only activity sink
//! - `Notifier`: outbound notification fan-out
//! - `WorkerLauncher`: external worker process lifecycle
//! - `ProcessSignaler`: SIGTERM/SIGKILL delivery
//!
//! These contracts keep the execution core independent of any concrete
//! database, transport, or process backend.

pub mod activity_log;
pub mod agent_store;
pub mod errors;
pub mod notifier;
pub mod process_signal;
pub mod task_store;
pub mod worker;

pub use activity_log::ActivityLog;
pub use agent_store::AgentStore;
pub use errors::StoreError;
pub use notifier::Notifier;
pub use process_signal::ProcessSignaler;
pub use task_store::TaskStore;
pub use worker::{
    LaunchRequest, Terminator, WorkerError, WorkerEvent, WorkerHandle, WorkerLauncher, WorkerSpec,
};

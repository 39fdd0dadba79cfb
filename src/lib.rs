//! Bullpen - admission-controlled execution pool for AI agent workers
//!
//! Bullpen launches one external worker process per task, enforces a global
//! concurrency cap with a FIFO wait queue, and guarantees every launched
//! process is eventually reaped: by natural completion, by explicit
//! cancellation, or by escalating SIGTERM/SIGKILL timeouts.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors, and port traits
//! - **Application Layer** (`application`): watchdog, process pool, and task
//!   coordinator
//! - **Service Layer** (`services`): notification fan-out
//! - **Infrastructure Layer** (`infrastructure`): worker CLI launcher,
//!   signalling, configuration, logging, in-memory stores
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use bullpen::application::TaskCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire stores, a launcher, and a notifier into a coordinator,
//!     // then call coordinator.execute_task(task_id).
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{
    PoolConfig, PoolStatus, ProcessPool, SpawnOutcome, TaskCoordinator, Watchdog, WatchdogConfig,
    WorkerEventHandler,
};
pub use domain::error::ExecutionError;
pub use domain::models::{
    ActivityAction, ActivityEntry, Agent, AgentStatus, Config, LoggingConfig, Notification,
    ResourceTier, Task, TaskPatch, TaskStatus, WorkerConfig,
};
pub use domain::ports::{
    ActivityLog, AgentStore, LaunchRequest, Notifier, ProcessSignaler, StoreError, TaskStore,
    Terminator, WorkerError, WorkerEvent, WorkerHandle, WorkerLauncher, WorkerSpec,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::NotificationHub;

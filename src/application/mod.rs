//! Application layer: the execution core.
//!
//! - [`Watchdog`]: per-task deadline enforcement with SIGTERM/SIGKILL
//!   escalation
//! - [`ProcessPool`]: admission control, FIFO queueing, and slot reclamation
//! - [`TaskCoordinator`]: the public entry point wiring pool events to
//!   persistence and notifications

pub mod process_pool;
pub mod task_coordinator;
pub mod watchdog;

pub use process_pool::{PoolConfig, ProcessPool, SpawnOutcome, WorkerEventHandler};
pub use task_coordinator::{PoolStatus, TaskCoordinator};
pub use watchdog::{Watchdog, WatchdogConfig};

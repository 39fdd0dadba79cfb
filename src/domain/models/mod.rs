pub mod activity;
pub mod agent;
pub mod config;
pub mod notification;
pub mod task;

pub use activity::{ActivityAction, ActivityEntry};
pub use agent::{Agent, AgentStatus, ResourceTier};
pub use config::{Config, LoggingConfig, WorkerConfig};
pub use notification::Notification;
pub use task::{Task, TaskPatch, TaskStatus};

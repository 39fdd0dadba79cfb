//! Configuration model.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for bullpen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Maximum number of concurrently running workers (1-100)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Default per-task deadline in milliseconds
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,

    /// Grace window between SIGTERM and SIGKILL in milliseconds
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// Worker process configuration
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_max_concurrent() -> usize {
    3
}

const fn default_task_timeout_ms() -> u64 {
    300_000
}

const fn default_kill_grace_ms() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            task_timeout_ms: default_task_timeout_ms(),
            kill_grace_ms: default_kill_grace_ms(),
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Default task deadline as a [`Duration`].
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    /// SIGTERM-to-SIGKILL grace window as a [`Duration`].
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

/// Worker process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkerConfig {
    /// Worker CLI command (resolved via PATH unless absolute)
    #[serde(default = "default_worker_command")]
    pub command: String,

    /// Maximum agent turns per worker invocation
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_worker_command() -> String {
    "claude".to_string()
}

const fn default_max_turns() -> u32 {
    25
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command: default_worker_command(),
            max_turns: default_max_turns(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

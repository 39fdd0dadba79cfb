//! Configuration loading with hierarchical merging.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;
use tracing::warn;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrent: {0}. Must be between 1 and 100")]
    InvalidMaxConcurrent(usize),

    #[error("Invalid task_timeout_ms: {0}. Must be positive")]
    InvalidTaskTimeout(u64),

    #[error("Invalid kill_grace_ms: {0}. Must be positive")]
    InvalidKillGrace(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Worker command cannot be empty")]
    EmptyWorkerCommand,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.bullpen/config.yaml` (project config)
    /// 3. `.bullpen/local.yaml` (project local overrides, optional)
    /// 4. Environment variables (`BULLPEN_*` prefix)
    /// 5. The plain deployment variables `MAX_CONCURRENT_AGENTS` and
    ///    `TASK_TIMEOUT_MS`
    pub fn load() -> Result<Config> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".bullpen/config.yaml"))
            .merge(Yaml::file(".bullpen/local.yaml"))
            .merge(Env::prefixed("BULLPEN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::apply_plain_env(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::apply_plain_env(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    // Deployments configure the pool through these two unprefixed variables;
    // they win over every file-based source.
    fn apply_plain_env(config: &mut Config) {
        if let Ok(value) = std::env::var("MAX_CONCURRENT_AGENTS") {
            match value.parse() {
                Ok(n) => config.max_concurrent = n,
                Err(_) => warn!(%value, "ignoring unparseable MAX_CONCURRENT_AGENTS"),
            }
        }
        if let Ok(value) = std::env::var("TASK_TIMEOUT_MS") {
            match value.parse() {
                Ok(ms) => config.task_timeout_ms = ms,
                Err(_) => warn!(%value, "ignoring unparseable TASK_TIMEOUT_MS"),
            }
        }
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.max_concurrent == 0 || config.max_concurrent > 100 {
            return Err(ConfigError::InvalidMaxConcurrent(config.max_concurrent));
        }

        if config.task_timeout_ms == 0 {
            return Err(ConfigError::InvalidTaskTimeout(config.task_timeout_ms));
        }

        if config.kill_grace_ms == 0 {
            return Err(ConfigError::InvalidKillGrace(config.kill_grace_ms));
        }

        if config.worker.command.trim().is_empty() {
            return Err(ConfigError::EmptyWorkerCommand);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            max_concurrent: 0,
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConcurrent(0))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_log_format() {
        let config = Config {
            logging: crate::domain::models::LoggingConfig {
                format: "xml".to_string(),
                ..crate::domain::models::LoggingConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(file, "max_concurrent: 7\nworker:\n  command: fake-agent").unwrap();

        temp_env::with_vars_unset(["MAX_CONCURRENT_AGENTS", "TASK_TIMEOUT_MS"], || {
            let config = ConfigLoader::load_from_file(file.path()).unwrap();
            assert_eq!(config.max_concurrent, 7);
            assert_eq!(config.worker.command, "fake-agent");
            assert_eq!(config.task_timeout_ms, 300_000);
        });
    }

    #[test]
    fn test_plain_env_overrides_win() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(file, "max_concurrent: 7").unwrap();

        temp_env::with_vars(
            [
                ("MAX_CONCURRENT_AGENTS", Some("5")),
                ("TASK_TIMEOUT_MS", Some("60000")),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert_eq!(config.max_concurrent, 5);
                assert_eq!(config.task_timeout_ms, 60_000);
            },
        );
    }

    #[test]
    fn test_unparseable_env_is_ignored() {
        temp_env::with_vars([("MAX_CONCURRENT_AGENTS", Some("lots"))], || {
            let mut config = Config::default();
            ConfigLoader::apply_plain_env(&mut config);
            assert_eq!(config.max_concurrent, 3);
        });
    }
}

//! `bullpen doctor`: environment sanity checks.

use crate::domain::models::Config;
use crate::infrastructure::worker::{CliLauncherConfig, CliWorkerLauncher};
use anyhow::Result;

pub async fn execute(config: &Config) -> Result<()> {
    println!("effective configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);

    let launcher = CliWorkerLauncher::new(CliLauncherConfig::from(config));
    if launcher.available().await {
        println!("worker CLI `{}` is runnable", config.worker.command);
        Ok(())
    } else {
        anyhow::bail!(
            "worker CLI `{}` is not runnable. Install it or set worker.command",
            config.worker.command
        )
    }
}

//! Worker launcher that shells out to the agent CLI.
//!
//! One external process per launch, started detached from interactive input
//! with both output streams captured. The launcher carries its own deadline,
//! independent of the pool's watchdog: on expiry it emits a single timeout
//! event, delivers SIGTERM, and escalates to SIGKILL after a grace window.
//! The child is always reaped.

use crate::domain::models::{Config, ResourceTier};
use crate::domain::ports::{
    LaunchRequest, ProcessSignaler, Terminator, WorkerError, WorkerEvent, WorkerHandle,
    WorkerLauncher,
};
use crate::infrastructure::worker::signal::UnixProcessSignaler;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

const READ_BUF_SIZE: usize = 8192;

/// Configuration for the CLI worker launcher.
#[derive(Debug, Clone)]
pub struct CliLauncherConfig {
    /// Worker CLI command (resolved via PATH unless absolute).
    pub command: String,
    /// Maximum agent turns per invocation.
    pub max_turns: u32,
    /// Deadline applied when a launch carries no override.
    pub default_timeout: Duration,
    /// Grace window between SIGTERM and SIGKILL after the deadline fires.
    pub kill_grace: Duration,
}

impl Default for CliLauncherConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            max_turns: 25,
            default_timeout: Duration::from_millis(300_000),
            kill_grace: Duration::from_millis(10_000),
        }
    }
}

impl From<&Config> for CliLauncherConfig {
    fn from(config: &Config) -> Self {
        Self {
            command: config.worker.command.clone(),
            max_turns: config.worker.max_turns,
            default_timeout: config.task_timeout(),
            kill_grace: config.kill_grace(),
        }
    }
}

/// Resolve a resource tier to a concrete model selection.
fn resolve_model(tier: ResourceTier) -> &'static str {
    match tier {
        ResourceTier::High => "claude-opus-4-6",
        ResourceTier::Low => "claude-haiku-4-5",
        ResourceTier::Medium => "claude-sonnet-4-6",
    }
}

/// Launches one worker CLI process per task.
pub struct CliWorkerLauncher {
    config: CliLauncherConfig,
    signaler: Arc<dyn ProcessSignaler>,
}

impl CliWorkerLauncher {
    pub fn new(config: CliLauncherConfig) -> Self {
        Self::with_signaler(config, Arc::new(UnixProcessSignaler))
    }

    pub fn with_signaler(config: CliLauncherConfig, signaler: Arc<dyn ProcessSignaler>) -> Self {
        Self { config, signaler }
    }

    /// Check whether the worker CLI is runnable (`--version` probe).
    pub async fn available(&self) -> bool {
        Command::new(&self.config.command)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn build_command(&self, request: &LaunchRequest) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.arg("--print")
            .arg("--output-format")
            .arg("json")
            .arg("--max-turns")
            .arg(self.config.max_turns.to_string())
            .arg("--model")
            .arg(resolve_model(request.spec.tier))
            .arg("-p")
            .arg(&request.spec.prompt);

        if let Some(ref dir) = request.spec.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl WorkerLauncher for CliWorkerLauncher {
    fn launch(&self, request: LaunchRequest) -> WorkerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let timeout = request.spec.timeout.unwrap_or(self.config.default_timeout);

        let mut child = match self.build_command(&request).spawn() {
            Ok(child) => child,
            Err(err) => {
                let failure = if err.kind() == ErrorKind::NotFound {
                    WorkerError::MissingExecutable(self.config.command.clone())
                } else {
                    WorkerError::Spawn(err.to_string())
                };
                warn!(task_id = %request.task_id, %failure, "worker spawn failed");
                let _ = tx.send(WorkerEvent::Failed(failure));
                return WorkerHandle {
                    events: rx,
                    pid: None,
                    terminator: Terminator::noop(),
                };
            }
        };

        let pid = child.id();
        debug!(task_id = %request.task_id, pid = ?pid, "worker process started");

        let terminator = match pid {
            Some(pid) => {
                let signaler = Arc::clone(&self.signaler);
                Terminator::new(move || signaler.terminate(pid))
            }
            None => Terminator::noop(),
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        tokio::spawn(supervise(
            request.task_id,
            child,
            pid,
            stdout,
            stderr,
            tx,
            timeout,
            self.config.kill_grace,
            Arc::clone(&self.signaler),
        ));

        WorkerHandle {
            events: rx,
            pid,
            terminator,
        }
    }
}

/// Drive one worker process to a single terminal event.
#[allow(clippy::too_many_arguments)]
async fn supervise(
    task_id: Uuid,
    mut child: Child,
    pid: Option<u32>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    tx: mpsc::UnboundedSender<WorkerEvent>,
    timeout: Duration,
    kill_grace: Duration,
    signaler: Arc<dyn ProcessSignaler>,
) {
    let stdout_task = tokio::spawn(pump_stdout(stdout, tx.clone()));
    let stderr_task = tokio::spawn(collect_stderr(stderr));

    tokio::select! {
        status = child.wait() => {
            let output = stdout_task.await.unwrap_or_default();
            let errors = stderr_task.await.unwrap_or_default();

            match status {
                Ok(status) if status.success() => {
                    debug!(%task_id, "worker completed");
                    let _ = tx.send(WorkerEvent::Complete(output));
                }
                Ok(status) => {
                    let code = status.code().unwrap_or(-1);
                    debug!(%task_id, code, "worker exited nonzero");
                    let _ = tx.send(WorkerEvent::Failed(WorkerError::NonZeroExit {
                        code,
                        stderr: errors.trim().to_string(),
                    }));
                }
                Err(err) => {
                    let _ = tx.send(WorkerEvent::Failed(WorkerError::Spawn(err.to_string())));
                }
            }
        }
        () = tokio::time::sleep(timeout) => {
            warn!(
                %task_id,
                pid = ?pid,
                timeout_ms = timeout.as_millis() as u64,
                "worker deadline exceeded, sending SIGTERM"
            );
            // Timeout is terminal and exclusive: the exit observed below is
            // never reported as complete/error.
            let _ = tx.send(WorkerEvent::TimedOut);
            if let Some(pid) = pid {
                signaler.terminate(pid);
            }

            tokio::select! {
                _ = child.wait() => {}
                () = tokio::time::sleep(kill_grace) => {
                    warn!(%task_id, pid = ?pid, "worker ignored SIGTERM, sending SIGKILL");
                    if let Some(pid) = pid {
                        signaler.kill(pid);
                    }
                    let _ = child.wait().await;
                }
            }

            stdout_task.abort();
            stderr_task.abort();
        }
    }
}

/// Stream stdout chunks as data events while accumulating the full output.
async fn pump_stdout(
    stdout: Option<ChildStdout>,
    tx: mpsc::UnboundedSender<WorkerEvent>,
) -> String {
    let Some(mut stdout) = stdout else {
        return String::new();
    };

    let mut collected = String::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        match stdout.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                collected.push_str(&chunk);
                let _ = tx.send(WorkerEvent::Data(chunk));
            }
        }
    }
    collected
}

async fn collect_stderr(stderr: Option<ChildStderr>) -> String {
    let Some(mut stderr) = stderr else {
        return String::new();
    };

    let mut collected = String::new();
    let _ = stderr.read_to_string(&mut collected).await;
    collected
}

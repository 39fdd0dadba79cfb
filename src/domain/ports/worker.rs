//! Worker launcher port: starts one external process per unit of work and
//! translates its lifecycle into a stream of events.

use crate::domain::models::ResourceTier;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// What to run: prompt, tier, and optional per-launch overrides.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub prompt: String,
    pub tier: ResourceTier,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl WorkerSpec {
    pub fn new(prompt: impl Into<String>, tier: ResourceTier) -> Self {
        Self {
            prompt: prompt.into(),
            tier,
            working_dir: None,
            timeout: None,
        }
    }
}

/// A launch request: the task identity plus its worker spec.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub task_id: Uuid,
    pub spec: WorkerSpec,
}

/// Failure modes of a worker launch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The worker CLI is not installed (spawn failed with `NotFound`).
    #[error("`{0}` not found. Install the worker CLI or point worker.command at it")]
    MissingExecutable(String),

    /// The OS refused to start the process for any other reason.
    #[error("failed to start worker process: {0}")]
    Spawn(String),

    /// The worker ran but exited with a nonzero status.
    #[error("worker exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Lifecycle events emitted for one launch.
///
/// Any number of `Data` events may arrive, in stdout arrival order, followed
/// by exactly one terminal event: `Complete`, `Failed`, or `TimedOut`.
/// Nothing is emitted after the terminal event; in particular, a worker that
/// exits after its deadline fired produces no `Complete`/`Failed`.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// One chunk of worker stdout, streamed as it arrives.
    Data(String),
    /// Clean exit (status 0); carries the full concatenated stdout.
    Complete(String),
    /// Spawn failure or nonzero exit.
    Failed(WorkerError),
    /// The launcher-internal deadline fired; the process is being torn down.
    TimedOut,
}

/// Capability to request graceful termination of a launched worker.
///
/// Signalling a worker that already exited is swallowed, not surfaced.
#[derive(Clone)]
pub struct Terminator(Arc<dyn Fn() + Send + Sync>);

impl Terminator {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A terminator for workers that never started.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Send the graceful-termination request.
    pub fn signal(&self) {
        (self.0)();
    }
}

impl std::fmt::Debug for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Terminator")
    }
}

/// Handle returned by a launch: the event stream, the pid (absent when the
/// process failed to start), and the termination capability.
#[derive(Debug)]
pub struct WorkerHandle {
    pub events: mpsc::UnboundedReceiver<WorkerEvent>,
    pub pid: Option<u32>,
    pub terminator: Terminator,
}

/// Port for starting external worker processes.
///
/// `launch` itself never fails: spawn errors are delivered on the event
/// stream, because by the time they are known the caller is no longer
/// synchronously waiting.
pub trait WorkerLauncher: Send + Sync {
    fn launch(&self, request: LaunchRequest) -> WorkerHandle;
}

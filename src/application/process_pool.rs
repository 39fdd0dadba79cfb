//! Admission-controlled process pool.
//!
//! The pool is the single concurrency gate for worker launches: at most
//! `max_concurrent` workers run at once, excess requests wait in a FIFO
//! queue, and every terminal event frees a slot and promotes the next
//! waiter. All bookkeeping lives behind one mutex that is never held across
//! an await; launch, cancellation, and terminal handling are each one atomic
//! transition under that lock, with handler callbacks dispatched outside it.

use crate::application::watchdog::Watchdog;
use crate::domain::ports::{
    LaunchRequest, Terminator, WorkerError, WorkerEvent, WorkerLauncher, WorkerSpec,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Pool sizing configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of concurrently running workers.
    pub max_concurrent: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_concurrent: 3 }
    }
}

/// Result of a spawn request: admitted immediately, or queued at a 1-based
/// FIFO position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnOutcome {
    pub queued: bool,
    pub position: usize,
}

impl SpawnOutcome {
    fn immediate() -> Self {
        Self {
            queued: false,
            position: 0,
        }
    }

    fn queued_at(position: usize) -> Self {
        Self {
            queued: true,
            position,
        }
    }
}

/// Callbacks a spawn request supplies for its worker's lifecycle.
///
/// For every launch, exactly one of `on_complete` / `on_error` / `on_timeout`
/// is invoked, preceded by any number of `on_data` calls. A launch cancelled
/// through [`ProcessPool::cancel`] invokes none of them.
#[async_trait]
pub trait WorkerEventHandler: Send + Sync {
    async fn on_data(&self, chunk: String) {
        let _ = chunk;
    }

    async fn on_complete(&self, output: String);

    async fn on_error(&self, error: WorkerError);

    async fn on_timeout(&self);
}

struct ActiveEntry {
    generation: u64,
    pid: Option<u32>,
    terminator: Terminator,
}

struct QueuedSpawn {
    task_id: Uuid,
    spec: WorkerSpec,
    handler: Arc<dyn WorkerEventHandler>,
}

#[derive(Default)]
struct PoolState {
    active: HashMap<Uuid, ActiveEntry>,
    queue: VecDeque<QueuedSpawn>,
}

struct PoolInner {
    state: Mutex<PoolState>,
    watchdog: Watchdog,
    launcher: Arc<dyn WorkerLauncher>,
    generation: AtomicU64,
    config: PoolConfig,
}

impl PoolInner {
    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Admission-controlled worker pool. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct ProcessPool {
    inner: Arc<PoolInner>,
}

impl ProcessPool {
    pub fn new(launcher: Arc<dyn WorkerLauncher>, watchdog: Watchdog, config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState::default()),
                watchdog,
                launcher,
                generation: AtomicU64::new(0),
                config,
            }),
        }
    }

    /// Request execution of a task's worker.
    ///
    /// A task that is already active is a no-op (duplicate launch requests
    /// are idempotent). At capacity the request joins the FIFO queue;
    /// otherwise the worker starts immediately.
    pub fn spawn(
        &self,
        task_id: Uuid,
        spec: WorkerSpec,
        handler: Arc<dyn WorkerEventHandler>,
    ) -> SpawnOutcome {
        let mut state = self.inner.state();

        if state.active.contains_key(&task_id) {
            debug!(%task_id, "spawn ignored, task already active");
            return SpawnOutcome::immediate();
        }

        if state.active.len() >= self.inner.config.max_concurrent {
            state.queue.push_back(QueuedSpawn {
                task_id,
                spec,
                handler,
            });
            let position = state.queue.len();
            info!(%task_id, position, "pool at capacity, task queued");
            return SpawnOutcome::queued_at(position);
        }

        self.launch_locked(&mut state, task_id, spec, handler);
        SpawnOutcome::immediate()
    }

    /// Cancel a task's pending or running worker.
    ///
    /// A queued task is silently removed (its worker never started, so no
    /// callback fires). An active task gets SIGTERM plus a forced-kill
    /// confirmation timer, its slot is freed synchronously, and any events
    /// still in flight from the detached worker are suppressed. Unknown
    /// tasks are a no-op.
    pub fn cancel(&self, task_id: Uuid) {
        let mut state = self.inner.state();

        if let Some(index) = state.queue.iter().position(|q| q.task_id == task_id) {
            state.queue.remove(index);
            debug!(%task_id, "queued task cancelled before launch");
            return;
        }

        if let Some(entry) = state.active.remove(&task_id) {
            info!(%task_id, pid = ?entry.pid, "cancelling active worker");
            self.inner.watchdog.cancel(task_id);
            entry.terminator.signal();
            if let Some(pid) = entry.pid {
                self.inner.watchdog.arm_kill(task_id, pid);
            }
            self.promote_locked(&mut state);
        }
    }

    /// Identifiers of currently active tasks.
    pub fn active(&self) -> Vec<Uuid> {
        self.inner.state().active.keys().copied().collect()
    }

    /// Number of tasks waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.inner.state().queue.len()
    }

    /// Shut the pool down: drop all queued requests without callbacks,
    /// signal every active worker, and clear bookkeeping. Best-effort; does
    /// not wait for processes to exit.
    pub fn cancel_all(&self) {
        let mut state = self.inner.state();
        let queued = state.queue.len();
        let active = state.active.len();
        info!(queued, active, "pool shutdown, cancelling all work");

        state.queue.clear();
        self.inner.watchdog.cancel_all();
        for (_, entry) in state.active.drain() {
            entry.terminator.signal();
        }
    }

    fn launch_locked(
        &self,
        state: &mut PoolState,
        task_id: Uuid,
        spec: WorkerSpec,
        handler: Arc<dyn WorkerEventHandler>,
    ) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let timeout = spec.timeout;

        let handle = self.inner.launcher.launch(LaunchRequest { task_id, spec });
        debug!(%task_id, pid = ?handle.pid, "worker launched");

        state.active.insert(
            task_id,
            ActiveEntry {
                generation,
                pid: handle.pid,
                terminator: handle.terminator,
            },
        );

        if let Some(pid) = handle.pid {
            self.inner.watchdog.watch(task_id, pid, timeout);
        }

        let pool = self.clone();
        tokio::spawn(pool.pump(task_id, generation, handle.events, handler));
    }

    /// Forward one launch's events to its handler. Terminal events release
    /// the slot (watchdog cancel, entry removal), dispatch the matching
    /// callback, then promote from the queue. A launch superseded by a
    /// cancel has all of its events swallowed instead.
    async fn pump(
        self,
        task_id: Uuid,
        generation: u64,
        mut events: mpsc::UnboundedReceiver<WorkerEvent>,
        handler: Arc<dyn WorkerEventHandler>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                WorkerEvent::Data(chunk) => {
                    if self.is_current(task_id, generation) {
                        handler.on_data(chunk).await;
                    }
                }
                WorkerEvent::Complete(output) => {
                    if self.release(task_id, generation) {
                        handler.on_complete(output).await;
                        self.promote();
                    }
                    break;
                }
                WorkerEvent::Failed(error) => {
                    if self.release(task_id, generation) {
                        handler.on_error(error).await;
                        self.promote();
                    }
                    break;
                }
                WorkerEvent::TimedOut => {
                    if self.release(task_id, generation) {
                        handler.on_timeout().await;
                        self.promote();
                    }
                    break;
                }
            }
        }
    }

    fn is_current(&self, task_id: Uuid, generation: u64) -> bool {
        self.inner
            .state()
            .active
            .get(&task_id)
            .is_some_and(|entry| entry.generation == generation)
    }

    /// Release the slot held by a launch, returning whether the launch was
    /// still current (false means it was cancelled and its events must be
    /// swallowed).
    fn release(&self, task_id: Uuid, generation: u64) -> bool {
        let mut state = self.inner.state();
        let current = state
            .active
            .get(&task_id)
            .is_some_and(|entry| entry.generation == generation);
        if !current {
            return false;
        }

        self.inner.watchdog.cancel(task_id);
        state.active.remove(&task_id);
        true
    }

    fn promote(&self) {
        let mut state = self.inner.state();
        self.promote_locked(&mut state);
    }

    fn promote_locked(&self, state: &mut PoolState) {
        while state.active.len() < self.inner.config.max_concurrent {
            let Some(next) = state.queue.pop_front() else {
                break;
            };
            // A task spawned twice while at capacity sits in the queue
            // twice; the promotion scan drops the stale duplicate.
            if state.active.contains_key(&next.task_id) {
                debug!(task_id = %next.task_id, "dropping queued duplicate of active task");
                continue;
            }
            info!(task_id = %next.task_id, "promoting queued task");
            self.launch_locked(state, next.task_id, next.spec, next.handler);
        }
    }
}

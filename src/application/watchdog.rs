//! Liveness watchdog: per-task deadline enforcement with escalating
//! SIGTERM -> SIGKILL delivery.
//!
//! The watchdog is layered above the launcher's own deadline so that a worker
//! process can never outlive its budget even if launcher-internal timeout
//! handling is bypassed. Timers decide to fire only while holding the entry
//! map lock and only if their generation still matches the live entry, so a
//! `cancel` that has returned guarantees no signal is ever sent for that task
//! afterwards.

use crate::domain::ports::ProcessSignaler;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Watchdog timing configuration.
#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    /// Deadline applied when a watch carries no per-task override.
    pub default_timeout: Duration,
    /// Grace window between SIGTERM and SIGKILL.
    pub kill_grace: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(300_000),
            kill_grace: Duration::from_millis(10_000),
        }
    }
}

struct WatchEntry {
    pid: u32,
    generation: u64,
    deadline: Option<JoinHandle<()>>,
    kill: Option<JoinHandle<()>>,
}

struct WatchdogInner {
    entries: Mutex<HashMap<Uuid, WatchEntry>>,
    generation: AtomicU64,
    signaler: Arc<dyn ProcessSignaler>,
    config: WatchdogConfig,
}

impl WatchdogInner {
    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, WatchEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Per-task deadline supervisor. Cheap to clone; all clones share one entry
/// map.
#[derive(Clone)]
pub struct Watchdog {
    inner: Arc<WatchdogInner>,
}

impl Watchdog {
    pub fn new(signaler: Arc<dyn ProcessSignaler>, config: WatchdogConfig) -> Self {
        Self {
            inner: Arc::new(WatchdogInner {
                entries: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                signaler,
                config,
            }),
        }
    }

    /// Start (or restart) the deadline for a task's worker process.
    ///
    /// Any existing watch for `task_id` is cancelled first. When the deadline
    /// expires the process receives SIGTERM, and SIGKILL after the grace
    /// window unless the entry is cancelled in between.
    pub fn watch(&self, task_id: Uuid, pid: u32, timeout: Option<Duration>) {
        self.cancel(task_id);

        let timeout = timeout.unwrap_or(self.inner.config.default_timeout);
        let generation = self.next_generation();
        self.insert_entry(task_id, pid, generation);

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            let kill_inner = Arc::clone(&inner);
            let mut entries = inner.entries();
            let Some(entry) = entries.get_mut(&task_id) else {
                return;
            };
            if entry.generation != generation {
                return;
            }

            warn!(
                %task_id,
                pid,
                timeout_ms = timeout.as_millis() as u64,
                "task deadline exceeded, sending SIGTERM"
            );
            inner.signaler.terminate(pid);
            entry.kill = Some(spawn_kill_timer(kill_inner, task_id, pid, generation));
        });

        self.attach_deadline(task_id, generation, handle);
    }

    /// Arm only the forced-kill confirmation timer for a task.
    ///
    /// Used after an explicit cancel has already delivered SIGTERM: if the
    /// process is still alive once the grace window elapses it gets SIGKILL.
    pub fn arm_kill(&self, task_id: Uuid, pid: u32) {
        self.cancel(task_id);

        let generation = self.next_generation();
        self.insert_entry(task_id, pid, generation);

        let handle = spawn_kill_timer(Arc::clone(&self.inner), task_id, pid, generation);
        let mut entries = self.inner.entries();
        match entries.get_mut(&task_id) {
            Some(entry) if entry.generation == generation => entry.kill = Some(handle),
            _ => handle.abort(),
        }
    }

    /// Cancel the watch for a task, clearing both pending timers.
    ///
    /// Idempotent; cancelling an unknown task is a no-op.
    pub fn cancel(&self, task_id: Uuid) {
        let entry = self.inner.entries().remove(&task_id);
        if let Some(entry) = entry {
            debug!(%task_id, pid = entry.pid, "watchdog entry cancelled");
            if let Some(handle) = entry.deadline {
                handle.abort();
            }
            if let Some(handle) = entry.kill {
                handle.abort();
            }
        }
    }

    /// Cancel every outstanding watch. Used on pool-wide shutdown.
    pub fn cancel_all(&self) {
        let ids: Vec<Uuid> = self.inner.entries().keys().copied().collect();
        for task_id in ids {
            self.cancel(task_id);
        }
    }

    /// Number of outstanding watch entries.
    pub fn watch_count(&self) -> usize {
        self.inner.entries().len()
    }

    fn next_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::Relaxed)
    }

    fn insert_entry(&self, task_id: Uuid, pid: u32, generation: u64) {
        self.inner.entries().insert(
            task_id,
            WatchEntry {
                pid,
                generation,
                deadline: None,
                kill: None,
            },
        );
    }

    // The entry is inserted before the timer task exists, so the timer can
    // never fire against a map that does not yet contain it; attach the
    // handle afterwards, aborting it if the entry was cancelled in between.
    fn attach_deadline(&self, task_id: Uuid, generation: u64, handle: JoinHandle<()>) {
        let mut entries = self.inner.entries();
        match entries.get_mut(&task_id) {
            Some(entry) if entry.generation == generation => entry.deadline = Some(handle),
            _ => handle.abort(),
        }
    }
}

fn spawn_kill_timer(
    inner: Arc<WatchdogInner>,
    task_id: Uuid,
    pid: u32,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(inner.config.kill_grace).await;

        let mut entries = inner.entries();
        let matches = entries
            .get(&task_id)
            .is_some_and(|entry| entry.generation == generation);
        if !matches {
            return;
        }

        warn!(%task_id, pid, "grace window elapsed, sending SIGKILL");
        inner.signaler.kill(pid);
        entries.remove(&task_id);
    })
}

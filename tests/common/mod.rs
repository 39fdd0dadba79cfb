//! Shared test doubles for the execution-core integration tests.

#![allow(dead_code)]

use bullpen::domain::ports::{
    LaunchRequest, ProcessSignaler, Terminator, WorkerError, WorkerEvent, WorkerHandle,
    WorkerLauncher,
};
use bullpen::WorkerEventHandler;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Worker launcher whose event streams are driven by the test.
#[derive(Default)]
pub struct MockLauncher {
    state: Mutex<MockLauncherState>,
}

#[derive(Default)]
struct MockLauncherState {
    launches: Vec<LaunchRequest>,
    senders: HashMap<Uuid, UnboundedSender<WorkerEvent>>,
    term_counts: HashMap<Uuid, Arc<AtomicUsize>>,
    missing_executable: HashSet<Uuid>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make launches for this task fail as if the CLI were not installed.
    pub fn fail_spawn_for(&self, task_id: Uuid) {
        self.state
            .lock()
            .unwrap()
            .missing_executable
            .insert(task_id);
    }

    pub fn launch_count(&self) -> usize {
        self.state.lock().unwrap().launches.len()
    }

    /// Task ids in launch order.
    pub fn launched_ids(&self) -> Vec<Uuid> {
        self.state
            .lock()
            .unwrap()
            .launches
            .iter()
            .map(|r| r.task_id)
            .collect()
    }

    pub fn last_request(&self) -> Option<LaunchRequest> {
        self.state.lock().unwrap().launches.last().cloned()
    }

    pub fn terminate_count(&self, task_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .term_counts
            .get(&task_id)
            .map_or(0, |c| c.load(Ordering::SeqCst))
    }

    fn send(&self, task_id: Uuid, event: WorkerEvent) {
        let sender = self.state.lock().unwrap().senders.get(&task_id).cloned();
        if let Some(sender) = sender {
            let _ = sender.send(event);
        }
    }

    pub fn emit_data(&self, task_id: Uuid, chunk: &str) {
        self.send(task_id, WorkerEvent::Data(chunk.to_string()));
    }

    pub fn emit_complete(&self, task_id: Uuid, output: &str) {
        self.send(task_id, WorkerEvent::Complete(output.to_string()));
    }

    pub fn emit_failure(&self, task_id: Uuid, code: i32, stderr: &str) {
        self.send(
            task_id,
            WorkerEvent::Failed(WorkerError::NonZeroExit {
                code,
                stderr: stderr.to_string(),
            }),
        );
    }

    pub fn emit_timeout(&self, task_id: Uuid) {
        self.send(task_id, WorkerEvent::TimedOut);
    }
}

impl WorkerLauncher for MockLauncher {
    fn launch(&self, request: LaunchRequest) -> WorkerHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();
        let task_id = request.task_id;
        let pid = 1000 + u32::try_from(state.launches.len()).unwrap();
        state.launches.push(request);

        if state.missing_executable.contains(&task_id) {
            let _ = tx.send(WorkerEvent::Failed(WorkerError::MissingExecutable(
                "claude".to_string(),
            )));
            return WorkerHandle {
                events: rx,
                pid: None,
                terminator: Terminator::noop(),
            };
        }

        let counter = Arc::new(AtomicUsize::new(0));
        state.term_counts.insert(task_id, Arc::clone(&counter));
        state.senders.insert(task_id, tx);

        WorkerHandle {
            events: rx,
            pid: Some(pid),
            terminator: Terminator::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        }
    }
}

/// Signal spy counting SIGTERM/SIGKILL deliveries per pid.
#[derive(Default)]
pub struct CountingSignaler {
    terms: Mutex<Vec<u32>>,
    kills: Mutex<Vec<u32>>,
}

impl CountingSignaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term_count(&self) -> usize {
        self.terms.lock().unwrap().len()
    }

    pub fn kill_count(&self) -> usize {
        self.kills.lock().unwrap().len()
    }

    pub fn terms(&self) -> Vec<u32> {
        self.terms.lock().unwrap().clone()
    }

    pub fn kills(&self) -> Vec<u32> {
        self.kills.lock().unwrap().clone()
    }
}

impl ProcessSignaler for CountingSignaler {
    fn terminate(&self, pid: u32) {
        self.terms.lock().unwrap().push(pid);
    }

    fn kill(&self, pid: u32) {
        self.kills.lock().unwrap().push(pid);
    }
}

/// Event handler that records every callback.
#[derive(Default)]
pub struct RecordingHandler {
    pub data: Mutex<Vec<String>>,
    pub completes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<WorkerError>>,
    pub timeouts: AtomicUsize,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn complete_count(&self) -> usize {
        self.completes.lock().unwrap().len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub fn timeout_count(&self) -> usize {
        self.timeouts.load(Ordering::SeqCst)
    }

    pub fn terminal_count(&self) -> usize {
        self.complete_count() + self.error_count() + self.timeout_count()
    }

    pub fn data_chunks(&self) -> Vec<String> {
        self.data.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerEventHandler for RecordingHandler {
    async fn on_data(&self, chunk: String) {
        self.data.lock().unwrap().push(chunk);
    }

    async fn on_complete(&self, output: String) {
        self.completes.lock().unwrap().push(output);
    }

    async fn on_error(&self, error: WorkerError) {
        self.errors.lock().unwrap().push(error);
    }

    async fn on_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll until `check` passes or a wall-clock budget elapses.
pub async fn wait_until(check: impl Fn() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(check(), "condition not reached within budget");
}

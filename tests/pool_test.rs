//! Process pool behavior: admission control, FIFO promotion, cancellation,
//! and callback delivery guarantees.

mod common;

use bullpen::domain::models::ResourceTier;
use bullpen::domain::ports::WorkerSpec;
use bullpen::{PoolConfig, ProcessPool, Watchdog, WatchdogConfig, WorkerError};
use common::{wait_until, CountingSignaler, MockLauncher, RecordingHandler};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn spec() -> WorkerSpec {
    WorkerSpec::new("do something", ResourceTier::Medium)
}

fn build_pool(max_concurrent: usize) -> (ProcessPool, Arc<MockLauncher>, Arc<CountingSignaler>) {
    let launcher = Arc::new(MockLauncher::new());
    let signaler = Arc::new(CountingSignaler::new());
    let watchdog = Watchdog::new(
        signaler.clone(),
        WatchdogConfig {
            default_timeout: Duration::from_secs(300),
            kill_grace: Duration::from_secs(10),
        },
    );
    let pool = ProcessPool::new(launcher.clone(), watchdog, PoolConfig { max_concurrent });
    (pool, launcher, signaler)
}

#[tokio::test]
async fn capacity_cap_and_queue_positions() {
    let (pool, launcher, _) = build_pool(2);
    let (t1, t2, t3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let o1 = pool.spawn(t1, spec(), RecordingHandler::new());
    let o2 = pool.spawn(t2, spec(), RecordingHandler::new());
    let o3 = pool.spawn(t3, spec(), RecordingHandler::new());

    assert!(!o1.queued);
    assert!(!o2.queued);
    assert!(o3.queued);
    assert_eq!(o3.position, 1);

    assert_eq!(pool.active().len(), 2);
    assert_eq!(pool.queue_len(), 1);
    assert_eq!(launcher.launch_count(), 2);
}

#[tokio::test]
async fn terminal_event_promotes_fifo() {
    let (pool, launcher, _) = build_pool(2);
    let (t1, t2, t3, t4) = (
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
    );

    pool.spawn(t1, spec(), RecordingHandler::new());
    pool.spawn(t2, spec(), RecordingHandler::new());
    pool.spawn(t3, spec(), RecordingHandler::new());
    pool.spawn(t4, spec(), RecordingHandler::new());
    assert_eq!(pool.queue_len(), 2);

    launcher.emit_complete(t1, "done");
    wait_until(|| launcher.launch_count() == 3).await;

    // t3 queued before t4, so t3 is promoted first.
    assert_eq!(launcher.launched_ids(), vec![t1, t2, t3]);
    let active = pool.active();
    assert!(active.contains(&t2) && active.contains(&t3));
    assert_eq!(pool.queue_len(), 1);

    launcher.emit_complete(t2, "done");
    wait_until(|| launcher.launch_count() == 4).await;
    assert_eq!(launcher.launched_ids(), vec![t1, t2, t3, t4]);
    assert_eq!(pool.queue_len(), 0);
}

#[tokio::test]
async fn duplicate_spawn_is_idempotent() {
    let (pool, launcher, _) = build_pool(2);
    let task = Uuid::new_v4();

    let first = pool.spawn(task, spec(), RecordingHandler::new());
    let second = pool.spawn(task, spec(), RecordingHandler::new());

    assert!(!first.queued);
    assert!(!second.queued);
    assert_eq!(second.position, 0);
    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(pool.active().len(), 1);
}

#[tokio::test]
async fn exactly_one_terminal_callback() {
    let (pool, launcher, _) = build_pool(1);
    let task = Uuid::new_v4();
    let handler = RecordingHandler::new();

    pool.spawn(task, spec(), handler.clone());
    launcher.emit_data(task, "chunk-1");
    launcher.emit_data(task, "chunk-2");
    launcher.emit_complete(task, "full output");
    // Anything after the terminal event is ignored.
    launcher.emit_failure(task, 1, "late");
    launcher.emit_timeout(task);

    wait_until(|| handler.terminal_count() == 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(handler.complete_count(), 1);
    assert_eq!(handler.error_count(), 0);
    assert_eq!(handler.timeout_count(), 0);
    assert_eq!(handler.data_chunks(), vec!["chunk-1", "chunk-2"]);
    assert!(pool.active().is_empty());
}

#[tokio::test]
async fn cancel_queued_task_never_launches() {
    let (pool, launcher, _) = build_pool(1);
    let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
    let queued_handler = RecordingHandler::new();

    pool.spawn(t1, spec(), RecordingHandler::new());
    pool.spawn(t2, spec(), queued_handler.clone());
    assert_eq!(pool.queue_len(), 1);

    pool.cancel(t2);
    assert_eq!(pool.queue_len(), 0);

    launcher.emit_complete(t1, "done");
    wait_until(|| pool.active().is_empty()).await;

    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(queued_handler.terminal_count(), 0);
}

#[tokio::test]
async fn cancel_active_removes_synchronously_and_signals() {
    let (pool, launcher, _) = build_pool(2);
    let task = Uuid::new_v4();

    pool.spawn(task, spec(), RecordingHandler::new());
    assert_eq!(pool.active(), vec![task]);

    pool.cancel(task);
    // Removal is synchronous regardless of whether the process exited.
    assert!(pool.active().is_empty());
    assert_eq!(launcher.terminate_count(task), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_active_arms_kill_confirmation() {
    let launcher = Arc::new(MockLauncher::new());
    let signaler = Arc::new(CountingSignaler::new());
    let watchdog = Watchdog::new(
        signaler.clone(),
        WatchdogConfig {
            default_timeout: Duration::from_secs(300),
            kill_grace: Duration::from_millis(100),
        },
    );
    let pool = ProcessPool::new(launcher, watchdog, PoolConfig { max_concurrent: 1 });
    let task = Uuid::new_v4();

    pool.spawn(task, spec(), RecordingHandler::new());
    pool.cancel(task);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(signaler.kill_count(), 1);
}

#[tokio::test]
async fn cancel_active_suppresses_late_events() {
    let (pool, launcher, _) = build_pool(2);
    let task = Uuid::new_v4();
    let handler = RecordingHandler::new();

    pool.spawn(task, spec(), handler.clone());
    pool.cancel(task);

    // The detached worker exits nonzero after the cancel; nothing surfaces.
    launcher.emit_data(task, "late chunk");
    launcher.emit_failure(task, 143, "terminated");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(handler.terminal_count(), 0);
    assert!(handler.data_chunks().is_empty());
}

#[tokio::test]
async fn cancel_frees_slot_for_queued_task() {
    let (pool, launcher, _) = build_pool(1);
    let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());

    pool.spawn(t1, spec(), RecordingHandler::new());
    pool.spawn(t2, spec(), RecordingHandler::new());

    pool.cancel(t1);
    assert_eq!(pool.active(), vec![t2]);
    assert_eq!(launcher.launch_count(), 2);
    assert_eq!(pool.queue_len(), 0);
}

#[tokio::test]
async fn spawn_failure_surfaces_missing_executable() {
    let (pool, launcher, _) = build_pool(2);
    let task = Uuid::new_v4();
    let handler = RecordingHandler::new();
    launcher.fail_spawn_for(task);

    let outcome = pool.spawn(task, spec(), handler.clone());
    assert!(!outcome.queued);

    wait_until(|| handler.error_count() == 1).await;
    let errors = handler.errors.lock().unwrap();
    assert!(matches!(errors[0], WorkerError::MissingExecutable(_)));
    assert!(errors[0].to_string().contains("Install"));
    drop(errors);

    assert!(pool.active().is_empty());
    assert_eq!(pool.queue_len(), 0);
}

#[tokio::test]
async fn cancel_all_clears_everything_without_callbacks() {
    let (pool, launcher, _) = build_pool(2);
    let (t1, t2, t3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let handlers = [
        RecordingHandler::new(),
        RecordingHandler::new(),
        RecordingHandler::new(),
    ];

    pool.spawn(t1, spec(), handlers[0].clone());
    pool.spawn(t2, spec(), handlers[1].clone());
    pool.spawn(t3, spec(), handlers[2].clone());

    pool.cancel_all();

    assert!(pool.active().is_empty());
    assert_eq!(pool.queue_len(), 0);
    assert_eq!(launcher.terminate_count(t1), 1);
    assert_eq!(launcher.terminate_count(t2), 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    for handler in &handlers {
        assert_eq!(handler.terminal_count(), 0);
    }
}

#[tokio::test]
async fn unknown_cancel_is_noop() {
    let (pool, _, _) = build_pool(1);
    pool.cancel(Uuid::new_v4());
    assert!(pool.active().is_empty());
    assert_eq!(pool.queue_len(), 0);
}

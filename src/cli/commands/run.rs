//! `bullpen run`: execute prompts through the full pool stack.

use crate::application::{
    PoolConfig, ProcessPool, TaskCoordinator, Watchdog, WatchdogConfig,
};
use crate::cli::RunArgs;
use crate::domain::models::{Agent, Config, Notification, ResourceTier, Task, TaskStatus};
use crate::infrastructure::memory::{InMemoryActivityLog, InMemoryStore};
use crate::infrastructure::worker::{CliLauncherConfig, CliWorkerLauncher, UnixProcessSignaler};
use crate::services::NotificationHub;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

pub async fn execute(args: RunArgs, config: &Config) -> Result<()> {
    let store = Arc::new(InMemoryStore::new());
    let activity = Arc::new(InMemoryActivityLog::new());
    let hub = NotificationHub::default();

    let launcher = Arc::new(CliWorkerLauncher::new(CliLauncherConfig::from(config)));
    let watchdog = Watchdog::new(
        Arc::new(UnixProcessSignaler),
        WatchdogConfig {
            default_timeout: config.task_timeout(),
            kill_grace: config.kill_grace(),
        },
    );
    let pool = ProcessPool::new(
        launcher,
        watchdog,
        PoolConfig {
            max_concurrent: config.max_concurrent,
        },
    );
    let coordinator = TaskCoordinator::new(
        pool,
        store.clone(),
        store.clone(),
        activity,
        Arc::new(hub.clone()),
    );

    let tier = ResourceTier::parse_or_default(&args.tier);
    let agent = Agent::new("cli", tier);
    crate::domain::ports::AgentStore::insert(store.as_ref(), &agent).await?;

    // Subscribe before spawning so no terminal event can slip past.
    let mut events = hub.subscribe();

    let mut pending: HashSet<Uuid> = HashSet::new();
    let mut titles: HashMap<Uuid, String> = HashMap::new();
    for prompt in &args.prompts {
        let mut task = Task::new(prompt.clone());
        task.agent_id = Some(agent.id);
        task.working_dir = args.cwd.clone();
        task.timeout_ms = args.timeout_secs.map(|secs| secs.saturating_mul(1000));
        crate::domain::ports::TaskStore::insert(store.as_ref(), &task).await?;
        titles.insert(task.id, task.title.clone());

        let outcome = coordinator.execute_task(task.id).await?;
        if outcome.queued {
            println!("{} queued at position {}", short_id(task.id), outcome.position);
        } else {
            println!("{} running", short_id(task.id));
        }
        pending.insert(task.id);
    }

    while !pending.is_empty() {
        tokio::select! {
            event = events.recv() => match event {
                Ok(Notification::TaskProgress { chunk, .. }) => {
                    if args.stream {
                        print!("{chunk}");
                        let _ = std::io::stdout().flush();
                    }
                }
                Ok(Notification::TaskCompleted { task_id, .. }) => {
                    println!("{} completed", short_id(task_id));
                    pending.remove(&task_id);
                }
                Ok(Notification::TaskFailed { task_id, error, .. }) => {
                    eprintln!("{} failed: {error}", short_id(task_id));
                    pending.remove(&task_id);
                }
                Ok(Notification::AgentStatus { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    eprintln!("warning: dropped {skipped} notifications");
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("interrupted, cancelling running workers");
                coordinator.shutdown();
                // The pool leaves persisted state to its caller; reconcile
                // whatever never reached a terminal event.
                for task_id in &pending {
                    let patch = crate::domain::models::TaskPatch {
                        status: Some(TaskStatus::Cancelled),
                        completed_at: Some(chrono::Utc::now()),
                        ..Default::default()
                    };
                    crate::domain::ports::TaskStore::update(store.as_ref(), *task_id, patch)
                        .await?;
                }
                break;
            }
        }
    }

    print_summary(&store, &titles).await?;
    Ok(())
}

async fn print_summary(store: &Arc<InMemoryStore>, titles: &HashMap<Uuid, String>) -> Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["task", "title", "status", "duration"]);

    for (task_id, title) in titles {
        let Some(task) = crate::domain::ports::TaskStore::get(store.as_ref(), *task_id).await?
        else {
            continue;
        };
        let duration = match task.completed_at {
            Some(done) => {
                let millis = (done - task.created_at).num_milliseconds();
                format!("{:.1}s", millis as f64 / 1000.0)
            }
            None => "-".to_string(),
        };
        table.add_row(vec![
            short_id(*task_id),
            truncate(title, 48),
            task.status.as_str().to_string(),
            duration,
        ]);
    }

    println!("{table}");
    Ok(())
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

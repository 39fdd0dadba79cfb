//! Broadcast-based notification hub.
//!
//! Replaces a module-global listener registry with an explicitly owned
//! object handed to the coordinator at construction time, so tests can
//! substitute a fake and multiple frontends can each hold a subscription.

use crate::domain::models::Notification;
use crate::domain::ports::Notifier;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out publisher for task and agent notifications. Cheap to clone; all
/// clones share one channel.
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the notification stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for NotificationHub {
    fn publish(&self, notification: Notification) {
        // A send with no subscribers is not an error; broadcast is lossy by
        // contract.
        let _ = self.sender.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let hub = NotificationHub::default();
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(Notification::TaskProgress {
            task_id: Uuid::new_v4(),
            agent_id: None,
            chunk: "chunk".to_string(),
        });
    }

    #[tokio::test]
    async fn test_subscribers_receive_notifications() {
        let hub = NotificationHub::default();
        let mut rx = hub.subscribe();

        let task_id = Uuid::new_v4();
        hub.publish(Notification::TaskCompleted {
            task_id,
            agent_id: None,
            output: "done".to_string(),
        });

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_name(), "task_completed");
        match received {
            Notification::TaskCompleted { task_id: id, .. } => assert_eq!(id, task_id),
            other => panic!("unexpected notification: {other:?}"),
        }
    }
}

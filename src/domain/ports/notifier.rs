use crate::domain::models::Notification;

/// Outbound notification publisher.
///
/// Publishing is broadcast fan-out with no delivery guarantee: a publish with
/// zero connected listeners is not an error. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn publish(&self, notification: Notification);
}

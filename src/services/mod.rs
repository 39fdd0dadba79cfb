//! Cross-cutting services shared by the application layer and frontends.

pub mod notification_hub;

pub use notification_hub::NotificationHub;

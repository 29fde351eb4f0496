//! Notification envelopes and their delivery to the hub.

mod envelope;
mod sender;

pub use envelope::{DATABASE_CHANGE_SUBJECT, NotificationContext, NotificationEnvelope};
pub use sender::{DEFAULT_HUB_TIMEOUT_SECONDS, NOTIFICATION_PATH, NotificationSender, Notifier};

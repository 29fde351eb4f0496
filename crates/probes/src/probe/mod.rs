//! Probe contract and its implementations.
//!
//! A probe is polled by a scheduler: every call to [`Probe::listen`] runs one
//! detection cycle and sends a notification for each new event it finds.
//! Neither `listen` nor `send_notification` fails outward; per-cycle errors are
//! logged and the probe keeps going.

mod database;
mod watermark;

pub use database::DatabaseProbe;
pub use watermark::{Clock, SystemClock, Watermark, WatermarkPolicy};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::error::ConfigError;
use crate::notification::{NotificationEnvelope, Notifier};

/// Polling contract shared by every probe kind
#[async_trait]
pub trait Probe: Send + Sync {
    /// Topic the probe's notifications are addressed to
    fn topic(&self) -> &str;

    /// Run one detection cycle
    async fn listen(&mut self) -> CycleReport;

    /// Deliver the pending message to the hub
    async fn send_notification(&self);
}

/// Summary of one `listen` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub queries_run: usize,
    pub queries_failed: usize,
    pub rows: usize,
    pub notifications_failed: usize,
    /// Watermark in effect after the cycle
    pub watermark: Watermark,
}

/// Topic, pending message and delivery channel common to all probes
pub struct ProbeCore {
    topic: String,
    subject: &'static str,
    pending_message: String,
    notifier: Arc<dyn Notifier>,
}

impl ProbeCore {
    pub fn new(
        topic: impl Into<String>,
        subject: &'static str,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        Ok(Self { topic, subject, pending_message: String::new(), notifier })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn pending_message(&self) -> &str {
        &self.pending_message
    }

    pub fn set_pending_message(&mut self, message: String) {
        self.pending_message = message;
    }

    /// Send the pending message. Returns whether delivery succeeded; failures
    /// are logged here and go no further.
    pub async fn send_notification(&self) -> bool {
        let envelope = NotificationEnvelope::new(&self.topic, self.subject, &self.pending_message);

        match self.notifier.notify(&envelope).await {
            Ok(()) => true,
            Err(e) => {
                let e = anyhow::Error::new(e);
                error!(topic = %self.topic, error = ?e, "Failed to send notification");
                false
            }
        }
    }
}

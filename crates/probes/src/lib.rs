//! Probes - polling change detection for notification hubs
//!
//! A probe periodically checks an external resource and sends one
//! notification per new event to a notification hub over HTTP. The
//! database probe runs a set of watermark-bound queries against a libsql
//! data source and turns every returned row into a notification.

pub mod error;
pub mod notification;
pub mod options;
pub mod probe;
pub mod query;
pub mod scheduler;
pub mod source;

pub use error::{ConfigError, NotifyError, ProbeError, SourceError};
pub use notification::{NotificationEnvelope, NotificationSender, Notifier};
pub use options::{DatabaseOptions, QuerySource};
pub use probe::{CycleReport, DatabaseProbe, Probe, Watermark, WatermarkPolicy};
pub use query::QuerySet;
pub use scheduler::{CycleOutcome, ProbeScheduler, ScheduledProbe};
pub use source::{ConnectionProvider, ConnectionSettings, Driver, LibsqlProvider, RowSource};

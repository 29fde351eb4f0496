use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::watermark::{Clock, SystemClock, Watermark, WatermarkPolicy};
use super::{CycleReport, Probe, ProbeCore};
use crate::error::ProbeError;
use crate::notification::{DATABASE_CHANGE_SUBJECT, Notifier};
use crate::options::DatabaseOptions;
use crate::query::QuerySet;
use crate::source::{ConnectionProvider, ConnectionSettings, RowSource};

/// Polls a relational data source and notifies the hub once per new row.
///
/// Every query is run with the previous watermark bound as its only
/// parameter and is expected to return rows whose event time is strictly
/// after it. Once all queries have run, the watermark moves to the time the
/// cycle started. Delivery is at-least-once: a row written between the start
/// of a cycle and its query may be delivered again by the next cycle.
///
/// With the default [`WatermarkPolicy::Advance`], a query that fails loses
/// its rows for that cycle's window because the watermark advances anyway.
pub struct DatabaseProbe {
    core: ProbeCore,
    settings: ConnectionSettings,
    queries: QuerySet,
    watermark: Watermark,
    policy: WatermarkPolicy,
    source: Box<dyn RowSource>,
    clock: Arc<dyn Clock>,
}

impl DatabaseProbe {
    /// Connect to the data source and build a probe watching `queries`.
    ///
    /// The connection handle is acquired here and kept for the probe's
    /// lifetime. The initial watermark is the construction time.
    pub async fn connect(
        topic: impl Into<String>,
        settings: ConnectionSettings,
        queries: QuerySet,
        provider: &dyn ConnectionProvider,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ProbeError> {
        let core = ProbeCore::new(topic, DATABASE_CHANGE_SUBJECT, notifier)?;
        let source = provider.connect(&settings).await?;

        info!(
            topic = %core.topic(),
            driver = %settings.driver,
            queries = queries.len(),
            "Database probe ready"
        );

        Ok(Self {
            core,
            settings,
            queries,
            watermark: Watermark::now(),
            policy: WatermarkPolicy::default(),
            source,
            clock: Arc::new(SystemClock),
        })
    }

    /// Build a probe from its configuration options
    pub async fn from_options(
        topic: impl Into<String>,
        options: &DatabaseOptions,
        provider: &dyn ConnectionProvider,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ProbeError> {
        let settings = options.settings()?;
        let queries = options.query_set()?;
        Self::connect(topic, settings, queries, provider, notifier).await
    }

    pub fn with_policy(mut self, policy: WatermarkPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_watermark(mut self, watermark: Watermark) -> Self {
        self.watermark = watermark;
        self
    }

    /// Override the watermark between cycles
    pub fn set_watermark(&mut self, watermark: Watermark) {
        self.watermark = watermark;
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    pub fn policy(&self) -> WatermarkPolicy {
        self.policy
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn queries(&self) -> &QuerySet {
        &self.queries
    }

    pub fn add_query(&mut self, query: impl Into<String>) -> bool {
        self.queries.insert(query)
    }

    pub fn remove_query(&mut self, query: &str) -> bool {
        self.queries.remove(query)
    }

    /// Content of the most recent notification
    pub fn pending_message(&self) -> &str {
        self.core.pending_message()
    }
}

#[async_trait]
impl Probe for DatabaseProbe {
    fn topic(&self) -> &str {
        self.core.topic()
    }

    async fn listen(&mut self) -> CycleReport {
        let cycle_start = self.clock.now();
        let bound = self.watermark.to_string();

        info!(topic = %self.core.topic(), watermark = %bound, "Database probe is listening");

        let mut queries_run = 0;
        let mut queries_failed = 0;
        let mut rows = 0;
        let mut notifications_failed = 0;

        for query in self.queries.iter() {
            queries_run += 1;
            debug!(topic = %self.core.topic(), query = %query, "Executing query");

            let results = match self.source.fetch(query, &bound).await {
                Ok(results) => results,
                Err(e) => {
                    queries_failed += 1;
                    let e = anyhow::Error::new(e);
                    error!(topic = %self.core.topic(), query = %query, error = ?e, "Query failed");
                    continue;
                }
            };

            for row in results {
                let message = row.flatten();
                debug!(topic = %self.core.topic(), response = %message, "Row matched");

                self.core.set_pending_message(message);
                rows += 1;
                if !self.core.send_notification().await {
                    notifications_failed += 1;
                }
            }
        }

        let next = self.policy.next(self.watermark, cycle_start, queries_failed > 0);
        if queries_failed > 0 {
            match self.policy {
                WatermarkPolicy::Advance => warn!(
                    topic = %self.core.topic(),
                    failed = queries_failed,
                    "Watermark advanced past failed queries; their rows in this window are skipped"
                ),
                WatermarkPolicy::Hold => warn!(
                    topic = %self.core.topic(),
                    failed = queries_failed,
                    "Watermark held back after failed queries"
                ),
            }
        }
        self.watermark = next;

        info!(
            topic = %self.core.topic(),
            queries = queries_run,
            failed = queries_failed,
            rows,
            watermark = %self.watermark,
            "Database probe cycle finished"
        );

        CycleReport {
            queries_run,
            queries_failed,
            rows,
            notifications_failed,
            watermark: self.watermark,
        }
    }

    async fn send_notification(&self) {
        self.core.send_notification().await;
    }
}

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, warn};

use crate::probe::{CycleReport, Probe};

const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// A probe together with how often it should be polled
pub struct ScheduledProbe {
    pub probe: Box<dyn Probe>,
    pub interval: Duration,
}

impl ScheduledProbe {
    pub fn new(probe: Box<dyn Probe>, interval: Duration) -> Self {
        Self { probe, interval }
    }
}

/// Report of one finished cycle, tagged with the probe's topic
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub topic: String,
    pub report: CycleReport,
}

/// Drives probes at fixed intervals, one task per probe
#[derive(Default)]
pub struct ProbeScheduler {
    outcome_tx: Option<mpsc::Sender<CycleOutcome>>,
}

impl ProbeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish every cycle's report on `outcome_tx`
    pub fn with_outcomes(mut self, outcome_tx: mpsc::Sender<CycleOutcome>) -> Self {
        self.outcome_tx = Some(outcome_tx);
        self
    }

    /// Poll a single probe until the task is aborted. The first cycle runs
    /// immediately; a slow cycle delays the next tick instead of bursting.
    pub fn schedule(&self, scheduled: ScheduledProbe) -> JoinHandle<()> {
        let outcome_tx = self.outcome_tx.clone();
        let ScheduledProbe { mut probe, interval: every } = scheduled;

        let every = if every < MIN_INTERVAL {
            warn!(topic = %probe.topic(), requested = ?every, "Poll interval too small, clamping");
            MIN_INTERVAL
        } else {
            every
        };

        tokio::spawn(async move {
            let mut timer = interval(every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;

                let report = probe.listen().await;

                if let Some(tx) = &outcome_tx {
                    let outcome = CycleOutcome { topic: probe.topic().to_string(), report };
                    if let Err(e) = tx.send(outcome).await {
                        error!("Failed to publish cycle outcome: {}", e);
                        break;
                    }
                }
            }
        })
    }

    pub fn schedule_all(&self, probes: Vec<ScheduledProbe>) -> Vec<JoinHandle<()>> {
        probes.into_iter().map(|scheduled| self.schedule(scheduled)).collect()
    }
}

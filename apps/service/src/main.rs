#![warn(clippy::all, clippy::pedantic)]

mod config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use logger::init_tracing;
use probes::{
    CycleOutcome, DatabaseProbe, LibsqlProvider, NotificationSender, Notifier, Probe,
    ProbeScheduler, ScheduledProbe,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use config::{Config, ProbeEntry};

#[derive(Debug, Parser)]
#[command(author, version, about = "Polls databases and notifies a hub about new rows")]
struct Args {
    /// Config file, defaults to $XDG_CONFIG_HOME/probes/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run one cycle of every enabled probe and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = Config::from_config(args.config.as_ref()).context("Failed to load configuration")?;
    info!("{config}");

    let sender: Arc<dyn Notifier> = Arc::new(
        NotificationSender::new(&config.hub.base_url, config.hub.timeout_seconds)
            .context("Invalid hub configuration")?,
    );

    let mut scheduled = Vec::new();
    for entry in config.enabled_probes() {
        let probe = connect_probe(entry, sender.clone())
            .await
            .with_context(|| format!("Failed to start probe {}", entry.topic))?;
        scheduled.push(ScheduledProbe::new(
            Box::new(probe),
            Duration::from_secs(entry.interval_seconds),
        ));
    }

    if scheduled.is_empty() {
        warn!("No enabled probes configured, nothing to do");
        return Ok(());
    }

    if args.once {
        run_once(scheduled).await;
        return Ok(());
    }

    run_scheduled(scheduled).await
}

async fn connect_probe(entry: &ProbeEntry, sender: Arc<dyn Notifier>) -> Result<DatabaseProbe> {
    let provider = LibsqlProvider::new()
        .with_query_timeout(Duration::from_secs(entry.query_timeout_seconds));

    let probe = DatabaseProbe::from_options(&entry.topic, &entry.database, &provider, sender)
        .await?
        .with_policy(entry.on_query_failure);

    Ok(probe)
}

async fn run_once(scheduled: Vec<ScheduledProbe>) {
    for ScheduledProbe { mut probe, .. } in scheduled {
        let report = probe.listen().await;
        info!(
            topic = %probe.topic(),
            rows = report.rows,
            failed_queries = report.queries_failed,
            failed_notifications = report.notifications_failed,
            "Single cycle finished"
        );
    }
}

async fn run_scheduled(scheduled: Vec<ScheduledProbe>) -> Result<()> {
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<CycleOutcome>(64);
    let scheduler = ProbeScheduler::new().with_outcomes(outcome_tx);

    info!(probes = scheduled.len(), "Starting probe scheduler");
    let handles = scheduler.schedule_all(scheduled);
    drop(scheduler);

    loop {
        tokio::select! {
            outcome = outcome_rx.recv() => {
                let Some(CycleOutcome { topic, report }) = outcome else {
                    warn!("All probe tasks stopped");
                    break;
                };
                if report.queries_failed > 0 || report.notifications_failed > 0 {
                    warn!(
                        topic = %topic,
                        failed_queries = report.queries_failed,
                        failed_notifications = report.notifications_failed,
                        "Cycle finished with failures"
                    );
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for shutdown signal")?;
                info!("Shutdown requested");
                break;
            }
        }
    }

    for handle in &handles {
        handle.abort();
    }
    join_all(handles).await;
    info!("Probe scheduler stopped");

    Ok(())
}

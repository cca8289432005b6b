//! Cron-driven scheduling of backup runs.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use cron::Schedule;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{error, info, warn};

use crate::pipeline::{BackupError, BackupPipeline};

/// Scheduling errors
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid schedule expression {expression:?}: {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: cron::error::Error,
    },
}

fn parse_schedule(expression: &str) -> Result<Schedule, ScheduleError> {
    Schedule::from_str(expression).map_err(|source| ScheduleError::InvalidExpression {
        expression: expression.to_string(),
        source,
    })
}

/// Owns the recurring trigger and the run lifecycle.
///
/// The schedule loop awaits each run to completion before computing the next
/// occurrence, so runs never overlap; ticks that pass while a run is executing
/// are skipped, not queued.
pub struct BackupScheduler {
    pipeline: Arc<BackupPipeline>,
    expression: String,
    shutdown: Option<mpsc::Sender<()>>,
}

impl BackupScheduler {
    pub fn new(pipeline: Arc<BackupPipeline>, expression: impl Into<String>) -> Self {
        Self {
            pipeline,
            expression: expression.into(),
            shutdown: None,
        }
    }

    /// Register the recurring trigger and spawn the schedule loop.
    ///
    /// A malformed expression is reported synchronously, before anything is
    /// spawned. One backup runs immediately at startup, ahead of the first
    /// scheduled occurrence.
    pub fn start(&mut self) -> Result<(), ScheduleError> {
        let schedule = parse_schedule(&self.expression)?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        self.shutdown = Some(shutdown_tx);

        let pipeline = Arc::clone(&self.pipeline);
        let expression = self.expression.clone();

        tokio::spawn(async move {
            info!(schedule = %expression, "backup scheduler started");

            info!("running initial backup");
            run_scheduled(&pipeline).await;

            loop {
                let Some(next) = schedule.upcoming(Local).next() else {
                    warn!("schedule has no upcoming occurrences");
                    break;
                };
                let delay = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);

                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    () = time::sleep(delay) => run_scheduled(&pipeline).await,
                }
            }

            info!("backup scheduler stopped");
        });

        Ok(())
    }

    /// Execute a single backup run, bypassing the recurring trigger.
    ///
    /// Must not be invoked concurrently with a scheduled run: both would race
    /// on the same retention prefix.
    pub async fn run_once(&self) -> Result<(), BackupError> {
        self.pipeline.run().await
    }

    /// Halt the recurring trigger. Idempotent; a run already in progress is
    /// not interrupted and completes on its own time budgets.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.try_send(());
        }
    }
}

async fn run_scheduled(pipeline: &BackupPipeline) {
    // The pipeline has already broadcast the failure notification.
    if let Err(error) = pipeline.run().await {
        error!(error = %error, "backup run failed");
    }
}

//! The Reaper: periodic expiry of vaults that stopped checking in.
//!
//! Each tick scans alive vaults, releases the overdue ones through the
//! store's guarded transition, and sends one notice per vault this tick
//! actually released. Failures are isolated per record.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use deadswitch_core::{evaluate, Clock, Evaluation, VaultRecord};
use deadswitch_notify::NotificationSink;
use deadswitch_store::VaultStore;

use crate::config::ReaperConfig;
use crate::error::{Result, SwitchError};

/// Floor for the tick period; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Alive vaults examined.
    pub scanned: usize,
    /// Vaults this tick moved to released.
    pub released: usize,
    /// Notices delivered.
    pub notified: usize,
    /// Notices that could not be delivered.
    pub notify_failures: usize,
    /// Records skipped because the store failed.
    pub errors: usize,
}

/// Releases overdue vaults and notifies their beneficiaries.
pub struct Reaper<S: VaultStore> {
    vaults: Arc<S>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: ReaperConfig,
}

impl<S: VaultStore> Reaper<S> {
    pub fn new(
        vaults: Arc<S>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: ReaperConfig,
    ) -> Self {
        Self {
            vaults,
            sink,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ReaperConfig {
        &self.config
    }

    /// Run one pass over all alive vaults.
    ///
    /// Only a failure to list vaults fails the tick. Anything that goes
    /// wrong with a single record is logged and counted.
    pub async fn tick(&self) -> Result<TickReport> {
        let now = self.clock.now_millis();
        let alive = self.vaults.list_alive().await?;

        let mut report = TickReport {
            scanned: alive.len(),
            ..TickReport::default()
        };

        for record in &alive {
            let Evaluation::Expired { elapsed_ms } = evaluate(record, now) else {
                continue;
            };

            match self
                .vaults
                .transition_to_released(&record.subject, record.version, now)
                .await
            {
                Ok(true) => {
                    report.released += 1;
                    tracing::info!(
                        subject = %record.subject,
                        beneficiary = %record.beneficiary,
                        elapsed_ms,
                        interval_ms = record.liveness_interval.as_millis(),
                        "vault released"
                    );

                    match self.notify(record).await {
                        Ok(()) => report.notified += 1,
                        Err(e) => {
                            report.notify_failures += 1;
                            tracing::warn!(
                                subject = %record.subject,
                                beneficiary = %record.beneficiary,
                                error = %e,
                                "release notice not delivered"
                            );
                        }
                    }
                }
                Ok(false) => {
                    tracing::debug!(
                        subject = %record.subject,
                        observed_version = record.version,
                        "expiry superseded by check-in or another tick"
                    );
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(
                        subject = %record.subject,
                        error = %e,
                        "expiry transition failed"
                    );
                }
            }
        }

        tracing::debug!(
            scanned = report.scanned,
            released = report.released,
            notified = report.notified,
            notify_failures = report.notify_failures,
            errors = report.errors,
            "reaper tick"
        );
        Ok(report)
    }

    async fn notify(&self, record: &VaultRecord) -> Result<()> {
        let notice = self
            .config
            .template
            .render(&record.subject, &record.beneficiary);
        self.sink.notify(&notice).await?;
        Ok(())
    }
}

impl<S: VaultStore + 'static> Reaper<S> {
    /// Run [`Reaper::tick`] every `config.period` on a background task.
    ///
    /// The first tick fires immediately. Must be called within a tokio
    /// runtime.
    pub fn spawn(self) -> ReaperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.config.period.max(MIN_PERIOD);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.tick().await {
                            tracing::error!(error = %e, "reaper tick failed");
                        }
                    }
                }
            }
            tracing::debug!("reaper stopped");
        });

        ReaperHandle { shutdown_tx, task }
    }
}

/// Handle to a running reaper task.
#[derive(Debug)]
pub struct ReaperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Stop the reaper and wait for the current tick to finish.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .map_err(|e| SwitchError::Task(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

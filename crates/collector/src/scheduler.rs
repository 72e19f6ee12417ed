//! Periodic driver for collection cycles.

use std::{sync::Arc, time::Duration};

use {
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::cycle::Collector;

/// Runs a cycle immediately, then again `interval` after each cycle ends.
///
/// A slow cycle delays the next one; cycles never overlap. Failures are
/// logged and the next cycle is scheduled as usual, with no backoff.
pub struct Scheduler {
    collector: Arc<Collector>,
    interval: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(collector: Arc<Collector>, interval: Duration) -> Self {
        Self {
            collector,
            interval,
        }
    }

    /// Start the loop on the runtime. Cancelling `cancel` stops it after the
    /// current cycle, or immediately while it is waiting.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        info!(
            guild_id = %self.collector.guild_id(),
            interval_secs = self.interval.as_secs(),
            "metrics collector started"
        );

        loop {
            let report = self.collector.run_cycle().await;
            if report.is_clean() {
                info!(
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    members = report.members,
                    channels = report.eligible_channels,
                    succeeded = report.channels.succeeded,
                    "collection cycle completed"
                );
            } else {
                warn!(
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    members = report.members,
                    enumerated = report.enumerated,
                    succeeded = report.channels.succeeded,
                    failed = report.channels.failed,
                    "collection cycle completed with errors"
                );
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {},
            }
        }

        info!("metrics collector stopped");
    }
}

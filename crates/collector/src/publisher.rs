//! Writes collection results into the shared gauge state.

use std::sync::Arc;

use {
    guildwatch_metrics::GaugeStore,
    tracing::{info, warn},
};

use crate::dispatcher::ChannelCountResult;

/// Counts of published and skipped channel results.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Publishes counts into a [`GaugeStore`].
///
/// Failed results are logged and skipped, so the previous value for that
/// channel stays visible instead of dropping to zero.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<GaugeStore>,
}

impl Publisher {
    #[must_use]
    pub fn new(store: Arc<GaugeStore>) -> Self {
        Self { store }
    }

    pub fn publish_members(&self, count: u64) {
        self.store.set_members(count);
        info!(count, "member count");
    }

    pub fn publish_results(&self, results: Vec<ChannelCountResult>) -> PublishSummary {
        let mut summary = PublishSummary::default();
        for result in results {
            match result.outcome {
                Ok(count) => {
                    self.store.set_channel_messages(&result.channel.name, count);
                    info!(channel = %result.channel.name, count, "channel message count");
                    summary.succeeded += 1;
                },
                Err(e) => {
                    warn!(
                        channel = %result.channel.name,
                        channel_id = %result.channel.id,
                        error = %e,
                        "failed to count messages, keeping previous value"
                    );
                    summary.failed += 1;
                },
            }
        }
        self.store.record_count_failures(summary.failed as u64);
        summary
    }
}

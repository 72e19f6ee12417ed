//! Process-wide gauge state shared by the collector and the exposition path.

use std::{
    sync::{PoisonError, RwLock},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    dashmap::DashMap,
    metrics::{counter, gauge},
    metrics_exporter_prometheus::{PrometheusHandle, PrometheusRecorder},
    tracing::trace,
};

use crate::{
    definitions::{collector, discord, labels},
    recorder::{MetricsRecorderConfig, build_recorder},
    snapshot::GaugeSnapshot,
};

/// Last published membership and per-channel message counts.
///
/// Writers set one label at a time, so concurrent channel tasks never contend
/// on the same entry. Readers (the `/metrics` handler) can render at any
/// point, including mid-cycle. Entries are only ever overwritten: a channel
/// that stops being counted keeps its last value.
pub struct GaugeStore {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    members: RwLock<Option<u64>>,
    channels: DashMap<String, u64>,
}

impl GaugeStore {
    #[must_use]
    pub fn new(config: &MetricsRecorderConfig) -> Self {
        let recorder = build_recorder(config);
        let handle = recorder.handle();
        Self {
            recorder,
            handle,
            members: RwLock::new(None),
            channels: DashMap::new(),
        }
    }

    pub fn set_members(&self, count: u64) {
        *self.members.write().unwrap_or_else(PoisonError::into_inner) = Some(count);
        metrics::with_local_recorder(&self.recorder, || {
            gauge!(discord::MEMBERS_COUNT).set(count as f64);
        });
        trace!(count, "members gauge updated");
    }

    #[must_use]
    pub fn members(&self) -> Option<u64> {
        *self.members.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_channel_messages(&self, channel: &str, count: u64) {
        self.channels.insert(channel.to_string(), count);
        metrics::with_local_recorder(&self.recorder, || {
            gauge!(discord::MESSAGE_COUNT, labels::CHANNEL => channel.to_string())
                .set(count as f64);
        });
        trace!(channel, count, "message gauge updated");
    }

    #[must_use]
    pub fn channel_messages(&self, channel: &str) -> Option<u64> {
        self.channels.get(channel).map(|entry| *entry.value())
    }

    /// Record the end of a collection cycle.
    pub fn record_cycle(&self, elapsed: Duration, finished_at: SystemTime) {
        let finished_secs = finished_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        metrics::with_local_recorder(&self.recorder, || {
            counter!(collector::CYCLES_TOTAL).increment(1);
            gauge!(collector::CYCLE_DURATION_SECONDS).set(elapsed.as_secs_f64());
            gauge!(collector::LAST_CYCLE_TIMESTAMP_SECONDS).set(finished_secs);
        });
    }

    pub fn record_count_failures(&self, failures: u64) {
        if failures == 0 {
            return;
        }
        metrics::with_local_recorder(&self.recorder, || {
            counter!(collector::CHANNEL_COUNT_FAILURES_TOTAL).increment(failures);
        });
    }

    /// Count a failed membership or enumeration request.
    pub fn record_upstream_failure(&self, phase: &'static str) {
        metrics::with_local_recorder(&self.recorder, || {
            counter!(collector::UPSTREAM_FAILURES_TOTAL, labels::PHASE => phase).increment(1);
        });
    }

    #[must_use]
    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            members: self.members(),
            channels: self
                .channels
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }

    /// Render every series in Prometheus text exposition format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl Default for GaugeStore {
    fn default() -> Self {
        Self::new(&MetricsRecorderConfig::default())
    }
}

//! Prometheus recorder construction.

use {
    metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder},
    tracing::debug,
};

/// Configuration for the exporter's recorder.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorderConfig {
    /// Labels added to every rendered series
    pub global_labels: Vec<(String, String)>,
}

/// Build a Prometheus recorder with every series described up front.
///
/// The recorder is returned to the caller instead of being installed as the
/// global `metrics` recorder.
#[must_use]
pub fn build_recorder(config: &MetricsRecorderConfig) -> PrometheusRecorder {
    let mut builder = PrometheusBuilder::new();
    for (key, value) in &config.global_labels {
        builder = builder.add_global_label(key, value);
    }

    let recorder = builder.build_recorder();
    metrics::with_local_recorder(&recorder, crate::definitions::describe_all);
    debug!(
        global_labels = config.global_labels.len(),
        "prometheus recorder built"
    );
    recorder
}

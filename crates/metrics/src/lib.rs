//! Gauge state and Prometheus exposition for guildwatch.
//!
//! The exporter owns its recorder: [`GaugeStore`] wraps a
//! `metrics_exporter_prometheus` recorder that is never installed globally,
//! so the collector and the `/metrics` handler share state only through an
//! `Arc<GaugeStore>`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use guildwatch_metrics::{GaugeStore, MetricsRecorderConfig};
//!
//! let store = GaugeStore::new(&MetricsRecorderConfig::default());
//! store.set_members(42);
//! store.set_channel_messages("general", 230);
//! let body = store.render();
//! ```

mod definitions;
mod recorder;
mod snapshot;
mod store;

pub use {
    definitions::*,
    recorder::{MetricsRecorderConfig, build_recorder},
    snapshot::GaugeSnapshot,
    store::GaugeStore,
};

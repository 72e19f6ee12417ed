//! Pull-based exposition of the gauge state over plain HTTP.
//!
//! Routes:
//! - `GET /metrics`: Prometheus text format, for scrapers
//! - `GET /api/metrics`: JSON snapshot of the published gauges
//! - `GET /health`: liveness probe

pub mod metrics_routes;
pub mod server;

pub use server::{AppState, build_app, serve, shutdown_signal};

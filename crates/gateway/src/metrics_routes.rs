//! Metrics routes for Prometheus scraping and JSON inspection.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
};

use crate::server::AppState;

/// Prometheus text exposition content type.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus metrics endpoint handler.
///
/// Renders the current gauge state; never waits on a collection cycle.
/// This endpoint is unauthenticated to allow metric scrapers to access it.
pub async fn prometheus_metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.store.render(),
    )
}

/// Last published gauges as JSON.
pub async fn api_metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.snapshot())
}

use std::sync::Arc;

use {
    anyhow::Context,
    axum::{Json, Router, response::IntoResponse, routing::get},
    guildwatch_metrics::GaugeStore,
    tokio::net::TcpListener,
    tokio_util::sync::CancellationToken,
    tower_http::trace::TraceLayer,
    tracing::info,
};

use crate::metrics_routes::{api_metrics_handler, prometheus_metrics_handler};

/// Shared state for every route: read-only access to the gauges.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GaugeStore>,
}

/// Build the router serving the exposition endpoints.
pub fn build_app(store: Arc<GaugeStore>) -> Router {
    Router::new()
        .route("/metrics", get(prometheus_metrics_handler))
        .route("/api/metrics", get(api_metrics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

/// Bind `bind:port` and serve until `shutdown` resolves.
pub async fn serve(
    bind: &str,
    port: u16,
    store: Arc<GaugeStore>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((bind, port))
        .await
        .with_context(|| format!("failed to bind metrics endpoint on {bind}:{port}"))?;
    info!(addr = %listener.local_addr()?, "starting HTTP server");

    axum::serve(listener, build_app(store))
        .with_graceful_shutdown(shutdown)
        .await
        .context("metrics endpoint failed")?;
    info!("HTTP server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, SIGTERM, or when `cancel` is cancelled, and cancels
/// `cancel` so background tasks stop too.
pub async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
        () = cancel.cancelled() => {},
    }
    cancel.cancel();
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

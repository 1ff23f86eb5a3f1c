//! Metrics HTTP endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::TelemetryResult;
use crate::metrics::RelayMetrics;

/// Router exposing `GET /metrics` and `GET /health`.
pub fn metrics_router(metrics: Arc<RelayMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .route("/health", get(health))
        .with_state(metrics)
}

async fn render_metrics(State(metrics): State<Arc<RelayMetrics>>) -> Response {
    match metrics.encode_text() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Serve metrics on `0.0.0.0:{port}` until `cancel` fires.
pub async fn serve_metrics(
    metrics: Arc<RelayMetrics>,
    port: u16,
    cancel: CancellationToken,
) -> TelemetryResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(port, "Starting metrics server");
    serve_on(listener, metrics, cancel).await
}

/// Serve metrics on an already bound listener until `cancel` fires.
pub async fn serve_on(
    listener: TcpListener,
    metrics: Arc<RelayMetrics>,
    cancel: CancellationToken,
) -> TelemetryResult<()> {
    axum::serve(listener, metrics_router(metrics))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

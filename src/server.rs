//! Metrics exposition server.
//!
//! Serves the pull-based `/metrics` endpoint that serializes all currently
//! registered metrics in the prometheus text exposition format on each
//! scrape, plus a liveness probe.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::metrics::MetricRegistry;

/// Content type of the prometheus text exposition format.
const TEXT_EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Errors that can occur while serving the exposition endpoint.
///
/// Both variants are fatal to the host process: the listener port is a
/// process-wide singleton and there is no retry.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Failed to bind the listener port.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The server terminated with an I/O error.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub metrics: MetricRegistry,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Build the exposition router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve the exposition endpoint forever.
///
/// Never returns under normal operation; a bind failure or server error
/// surfaces as a `ServeError` that callers treat as fatal.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    tracing::info!(%addr, "starting metrics listener");
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_EXPOSITION_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

//! Health, backend status, and metrics handlers.

use crate::api::AppState;
use crate::orchestrator::ServiceStatus;
use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: i64,
    pub backends: BackendCounts,
}

/// Backend availability counts.
#[derive(Debug, Serialize)]
pub struct BackendCounts {
    pub total: usize,
    pub available: usize,
    pub rate_limited: usize,
}

/// GET /health - Return system health status.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let views = state.service.registry().views();
    let total = views.len();
    let rate_limited = views.iter().filter(|v| v.rate_limit.exhausted()).count();
    let available = views
        .iter()
        .filter(|v| v.available && !v.rate_limit.exhausted())
        .count();

    let status = match (available, total) {
        (a, t) if a == t && t > 0 => "healthy",
        (a, _) if a > 0 => "degraded",
        _ => "unhealthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.service.uptime_seconds(),
        backends: BackendCounts {
            total,
            available,
            rate_limited,
        },
    })
}

/// GET /v1/backends - Backend views, limiter snapshots, and usage counters.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    Json(state.service.status())
}

/// GET /metrics - Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render_metrics(),
    )
}

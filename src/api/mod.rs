//! # HTTP API
//!
//! JSON endpoints over the [`ChatService`] facade.
//!
//! ## Endpoints
//!
//! - `POST /v1/chat` - Serve one chat turn with adaptive fallback
//! - `POST /v1/feedback` - Record feedback on an earlier response
//! - `GET /v1/insights` - Underperformers, top performers, trends
//! - `GET /v1/recommendations` - Actionable items and preferred backend per style
//! - `GET /v1/analytics` - Satisfaction totals and per-pair rows
//! - `GET /v1/backends` - Backend status with limiter snapshots
//! - `GET /health` - Availability summary
//! - `GET /metrics` - Prometheus exposition
//!
//! ## Example
//!
//! ```no_run
//! use chatroute::api::{create_router, AppState};
//! use chatroute::config::{ChatrouteConfig, FeedbackConfig, RecommendationConfig};
//! use chatroute::feedback::FeedbackStore;
//! use chatroute::metrics::{detached_handle, MetricsCollector};
//! use chatroute::orchestrator::ChatService;
//! use chatroute::registry::Registry;
//! use chatroute::style::StyleCatalog;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(Registry::new());
//! let feedback = Arc::new(FeedbackStore::in_memory(FeedbackConfig::default()));
//! let service = Arc::new(ChatService::new(
//!     Arc::clone(&registry),
//!     feedback,
//!     StyleCatalog::default(),
//!     RecommendationConfig::default(),
//! ));
//! let metrics = Arc::new(MetricsCollector::new(registry, detached_handle()));
//! let state = Arc::new(AppState::new(service, metrics, Arc::new(ChatrouteConfig::default())));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, create_router(state)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Errors share one envelope; exhaustion adds the per-candidate reasons:
//! ```json
//! {
//!   "error": {"message": "All backends exhausted: [...]", "type": "server_error", "code": "service_unavailable"},
//!   "failures": [{"backend": "gemini", "kind": "rate_limited", "message": "..."}]
//! }
//! ```

mod chat;
mod error;
mod feedback;
mod health;
mod insights;
pub mod types;

pub use types::*;

use crate::config::ChatrouteConfig;
use crate::metrics::MetricsCollector;
use crate::orchestrator::ChatService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub service: Arc<ChatService>,
    pub metrics: Arc<MetricsCollector>,
    pub config: Arc<ChatrouteConfig>,
}

impl AppState {
    pub fn new(
        service: Arc<ChatService>,
        metrics: Arc<MetricsCollector>,
        config: Arc<ChatrouteConfig>,
    ) -> Self {
        Self {
            service,
            metrics,
            config,
        }
    }
}

/// Create the API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.server.max_body_bytes;
    Router::new()
        .route("/v1/chat", post(chat::handle))
        .route("/v1/feedback", post(feedback::handle))
        .route("/v1/insights", get(insights::insights))
        .route("/v1/recommendations", get(insights::recommendations))
        .route("/v1/analytics", get(insights::analytics))
        .route("/v1/backends", get(health::status))
        .route("/health", get(health::handle))
        .route("/metrics", get(health::metrics))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

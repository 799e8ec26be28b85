//! Read-only feedback reports.

use super::{ApiError, AppState};
use crate::feedback::{Analytics, Insights, Recommendation};
use crate::orchestrator::StyleRecommendation;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
    /// Current preferred backend per style
    pub preferred: Vec<StyleRecommendation>,
}

/// GET /v1/insights
pub async fn insights(State(state): State<Arc<AppState>>) -> Result<Json<Insights>, ApiError> {
    Ok(Json(state.service.insights()?))
}

/// GET /v1/recommendations
pub async fn recommendations(State(state): State<Arc<AppState>>) -> Json<RecommendationsResponse> {
    Json(RecommendationsResponse {
        recommendations: state.service.recommendations(),
        preferred: state.service.preferred_backends(),
    })
}

/// GET /v1/analytics
pub async fn analytics(State(state): State<Arc<AppState>>) -> Result<Json<Analytics>, ApiError> {
    Ok(Json(state.service.analytics()?))
}

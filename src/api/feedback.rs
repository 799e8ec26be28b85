//! `POST /v1/feedback` handler.

use super::{ApiError, AppState, FeedbackRequest, FeedbackResponse};
use crate::feedback::FeedbackRecord;
use crate::style::ConversationStyle;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ApiError> {
    let style: ConversationStyle = request
        .style
        .parse()
        .map_err(|e: String| ApiError::invalid_param("style", e))?;

    let mut record = FeedbackRecord::new(
        request.message_id,
        request.conversation_id.unwrap_or_default(),
        request.kind,
        request.backend,
        style,
    )
    .with_response_error(request.response_error);
    if let Some(latency) = request.latency_seconds {
        record = record.with_latency(latency);
    }
    if let Some(session) = request.session_id {
        record = record.with_session(session);
    }

    // SQLite writes block; keep them off the async workers serving chat turns.
    let service = Arc::clone(&state.service);
    let aggregate = tokio::task::spawn_blocking(move || service.record_feedback(record))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "feedback write task failed");
            ApiError::internal("Feedback could not be stored")
        })??;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            accepted: true,
            aggregate,
        }),
    ))
}

//! `POST /v1/chat` handler.

use super::{ApiError, AppState, ChatRequest, ChatResponse};
use crate::logging::{conversation_preview, generate_request_id};
use crate::style::ConversationStyle;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::{info_span, Instrument};

pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.conversation.is_empty() {
        return Err(ApiError::invalid_param(
            "conversation",
            "Conversation must contain at least one turn",
        ));
    }

    let style = match request.style.as_deref() {
        Some(name) => name
            .parse::<ConversationStyle>()
            .map_err(|e| ApiError::invalid_param("style", e))?,
        None => ConversationStyle::default(),
    };

    let request_id = generate_request_id();
    let span = info_span!("chat", request_id = %request_id, style = %style);

    async move {
        if let Some(preview) = conversation_preview(
            &request.conversation,
            state.config.logging.enable_content_logging,
        ) {
            tracing::debug!(preview = %preview, "incoming chat turn");
        }

        let routed = tokio::time::timeout(
            state.config.server.request_timeout(),
            state.service.handle_chat_turn(&request.conversation, style),
        )
        .await
        .map_err(|_| {
            tracing::warn!("chat turn exceeded request timeout");
            ApiError::gateway_timeout()
        })??;

        Ok::<_, ApiError>(Json(ChatResponse::from_result(routed, style.as_str())))
    }
    .instrument(span)
    .await
}

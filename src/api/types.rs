//! Request and response bodies for the HTTP API.

use crate::agent::{ChatTurn, TokenCount};
use crate::feedback::{FeedbackKind, PerformanceAggregate};
use crate::routing::{AttemptFailure, RoutingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `POST /v1/chat` body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub conversation: Vec<ChatTurn>,
    /// Style name; the default style when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// `POST /v1/chat` success body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
    pub message_id: String,
    pub backend: String,
    pub content: String,
    pub style: String,
    pub latency_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenCount>,
    pub fallback_used: bool,
    /// Candidates skipped or failed before `backend` answered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<AttemptFailure>,
    pub timestamp: DateTime<Utc>,
}

impl ChatResponse {
    pub fn from_result(result: RoutingResult, style: &str) -> Self {
        let response = result.response;
        Self {
            message_id: response.message_id,
            backend: result.backend_used,
            content: response.content,
            style: style.to_string(),
            latency_seconds: response.latency_seconds,
            tokens: response.tokens,
            fallback_used: result.fallback_used,
            skipped: result.failures,
            timestamp: response.timestamp,
        }
    }
}

/// `POST /v1/feedback` body.
///
/// The kind is flattened, so a rating reads
/// `{"message_id": "...", "backend": "gemini", "style": "casual", "type": "rating", "value": 4}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackRequest {
    pub message_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub backend: String,
    pub style: String,
    #[serde(flatten)]
    pub kind: FeedbackKind,
    #[serde(default)]
    pub latency_seconds: Option<f64>,
    #[serde(default)]
    pub response_error: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `POST /v1/feedback` success body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackResponse {
    pub accepted: bool,
    pub aggregate: PerformanceAggregate,
}

/// API error response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
    /// Per-candidate reasons when every backend was exhausted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AttemptFailure>,
}

/// Error details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

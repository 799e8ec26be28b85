//! Mapping of domain errors onto HTTP responses.

use super::types::{ApiError, ApiErrorBody};
use crate::feedback::FeedbackError;
use crate::routing::RoutingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

impl ApiError {
    fn with_code(message: impl Into<String>, r#type: &str, code: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.into(),
                r#type: r#type.to_string(),
                param: None,
                code: Some(code.to_string()),
            },
            failures: Vec::new(),
        }
    }

    /// Create a bad request error (400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code(message, "invalid_request_error", "invalid_request_error")
    }

    /// Bad request pointing at one body field.
    pub fn invalid_param(param: &str, message: impl Into<String>) -> Self {
        let mut err = Self::bad_request(message);
        err.error.param = Some(param.to_string());
        err
    }

    /// Create a gateway timeout error (504).
    pub fn gateway_timeout() -> Self {
        Self::with_code(
            "Request timed out before any backend replied",
            "server_error",
            "gateway_timeout",
        )
    }

    /// Create a service unavailable error (503).
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::with_code(message, "server_error", "service_unavailable")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(message, "server_error", "internal_error")
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("invalid_request_error") => StatusCode::BAD_REQUEST,
            Some("gateway_timeout") => StatusCode::GATEWAY_TIMEOUT,
            Some("service_unavailable") => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RoutingError> for ApiError {
    fn from(err: RoutingError) -> Self {
        let mut api = Self::service_unavailable(err.to_string());
        api.failures = err.failures().to_vec();
        api
    }
}

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        if err.is_invalid_input() {
            Self::bad_request(err.to_string())
        } else {
            tracing::error!(error = %err, "feedback storage failure");
            Self::internal("Feedback could not be stored")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

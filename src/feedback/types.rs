//! Feedback records as submitted by the feedback collection surface.

use super::FeedbackError;
use crate::style::ConversationStyle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rating that a thumbs-up counts as in the rating average.
pub const THUMBS_UP_RATING: u8 = 5;
/// Rating that a thumbs-down counts as in the rating average.
pub const THUMBS_DOWN_RATING: u8 = 1;

/// One user judgment about a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackKind {
    ThumbsUp,
    ThumbsDown,
    /// Explicit 1-5 star rating
    Rating { value: u8 },
    /// Free-text comment, optionally with a rating
    Detailed {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rating: Option<u8>,
    },
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::ThumbsUp => "thumbs_up",
            FeedbackKind::ThumbsDown => "thumbs_down",
            FeedbackKind::Rating { .. } => "rating",
            FeedbackKind::Detailed { .. } => "detailed",
        }
    }

    /// The rating this feedback contributes to the average, if any.
    pub fn rating(&self) -> Option<u8> {
        match self {
            FeedbackKind::ThumbsUp => Some(THUMBS_UP_RATING),
            FeedbackKind::ThumbsDown => Some(THUMBS_DOWN_RATING),
            FeedbackKind::Rating { value } => Some(*value),
            FeedbackKind::Detailed { rating, .. } => *rating,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            FeedbackKind::Detailed { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.rating().is_some_and(|r| r >= 4)
    }

    pub fn is_negative(&self) -> bool {
        self.rating().is_some_and(|r| r <= 2)
    }

    /// Rebuild a kind from its stored columns.
    #[cfg(test)]
    pub(crate) fn from_parts(
        kind: &str,
        rating: Option<u8>,
        comment: Option<String>,
    ) -> Result<Self, FeedbackError> {
        match (kind, rating) {
            ("thumbs_up", _) => Ok(FeedbackKind::ThumbsUp),
            ("thumbs_down", _) => Ok(FeedbackKind::ThumbsDown),
            ("rating", Some(value)) => Ok(FeedbackKind::Rating { value }),
            ("detailed", rating) => Ok(FeedbackKind::Detailed {
                text: comment.unwrap_or_default(),
                rating,
            }),
            (other, _) => Err(FeedbackError::Storage(format!(
                "unrecognized stored feedback kind: {}",
                other
            ))),
        }
    }
}

/// An append-only feedback record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// The `ModelResponse::message_id` being rated
    pub message_id: String,
    pub conversation_id: String,
    pub kind: FeedbackKind,
    pub backend: String,
    pub style: ConversationStyle,
    /// Latency of the rated response, as observed when it was served
    #[serde(default)]
    pub latency_seconds: Option<f64>,
    /// The rated response was an error message rather than a model reply
    #[serde(default)]
    pub response_error: bool,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl FeedbackRecord {
    pub fn new(
        message_id: impl Into<String>,
        conversation_id: impl Into<String>,
        kind: FeedbackKind,
        backend: impl Into<String>,
        style: ConversationStyle,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            conversation_id: conversation_id.into(),
            kind,
            backend: backend.into(),
            style,
            latency_seconds: None,
            response_error: false,
            timestamp: Utc::now(),
            session_id: None,
        }
    }

    pub fn with_latency(mut self, latency_seconds: f64) -> Self {
        self.latency_seconds = Some(latency_seconds);
        self
    }

    pub fn with_response_error(mut self, response_error: bool) -> Self {
        self.response_error = response_error;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Reject records that would corrupt an aggregate.
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if self.message_id.trim().is_empty() {
            return Err(FeedbackError::MissingField("message_id"));
        }
        if self.backend.trim().is_empty() {
            return Err(FeedbackError::MissingField("backend"));
        }
        if let Some(rating) = self.kind.rating() {
            if !(1..=5).contains(&rating) {
                return Err(FeedbackError::InvalidRating(rating));
            }
        }
        if let Some(latency) = self.latency_seconds {
            if !latency.is_finite() || latency < 0.0 {
                return Err(FeedbackError::InvalidLatency(latency));
            }
        }
        Ok(())
    }
}

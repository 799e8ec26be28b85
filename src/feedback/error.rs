//! Feedback store error types

use thiserror::Error;

/// Errors from recording or reading feedback
#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Latency must be a finite, non-negative number of seconds, got {0}")]
    InvalidLatency(f64),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl FeedbackError {
    /// Whether the caller sent bad input, as opposed to a storage fault.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            FeedbackError::InvalidRating(_)
                | FeedbackError::InvalidLatency(_)
                | FeedbackError::MissingField(_)
        )
    }
}

//! Error types for agent operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while a backend serves a chat turn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    /// Backend is not configured (missing credential, disabled).
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Upstream quota exhausted.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Backend returned an error response that is worth retrying elsewhere.
    #[error("Backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Backend response doesn't match expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    /// Classify a non-success HTTP status returned by a backend.
    ///
    /// 401/403 mean the credential is unusable, 429 means the vendor quota is
    /// spent; everything else is treated as a transient upstream failure.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => AgentError::Unavailable(format!("{}: {}", status, message)),
            429 => AgentError::RateLimited(message),
            _ => AgentError::Upstream { status, message },
        }
    }

    /// Map a reqwest error onto the agent taxonomy.
    pub fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            AgentError::Timeout(timeout_ms)
        } else if err.is_decode() {
            AgentError::InvalidResponse(err.to_string())
        } else {
            AgentError::Network(err.to_string())
        }
    }

    /// The routing-level failure class of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            AgentError::Unavailable(_) => FailureKind::Unavailable,
            AgentError::RateLimited(_) => FailureKind::RateLimited,
            AgentError::Network(_) | AgentError::Timeout(_) | AgentError::Upstream { .. } => {
                FailureKind::Transient
            }
            AgentError::InvalidResponse(_) => FailureKind::InvalidResponse,
        }
    }
}

/// The four reasons a candidate backend can be skipped during fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Not configured or reachable; expected, skipped silently.
    Unavailable,
    /// Local budget or upstream quota exhausted.
    RateLimited,
    /// Timeout, network error, or retryable upstream error.
    Transient,
    /// Malformed payload from the remote.
    InvalidResponse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Unavailable => "unavailable",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Transient => "transient",
            FailureKind::InvalidResponse => "invalid_response",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            AgentError::from_status(401, "bad key").kind(),
            FailureKind::Unavailable
        );
        assert_eq!(
            AgentError::from_status(403, "forbidden").kind(),
            FailureKind::Unavailable
        );
        assert_eq!(
            AgentError::from_status(429, "quota").kind(),
            FailureKind::RateLimited
        );
        assert_eq!(
            AgentError::from_status(500, "boom").kind(),
            FailureKind::Transient
        );
        assert_eq!(
            AgentError::from_status(503, "loading").kind(),
            FailureKind::Transient
        );
    }

    #[test]
    fn timeout_is_transient() {
        assert_eq!(AgentError::Timeout(8000).kind(), FailureKind::Transient);
        assert_eq!(
            AgentError::Network("refused".into()).kind(),
            FailureKind::Transient
        );
    }

    #[test]
    fn failure_kind_serde() {
        let json = serde_json::to_string(&FailureKind::InvalidResponse).unwrap();
        assert_eq!(json, "\"invalid_response\"");
        assert_eq!(FailureKind::RateLimited.to_string(), "rate_limited");
    }
}

//! Error types for routing failures

use crate::agent::FailureKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why one candidate in the fallback chain did not serve the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub backend: String,
    pub kind: FailureKind,
    pub message: String,
}

impl AttemptFailure {
    pub fn new(backend: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: {})", self.backend, self.kind, self.message)
    }
}

/// Errors that can occur during backend selection
#[derive(Debug, Clone, Error)]
pub enum RoutingError {
    /// Every candidate was skipped or failed; one entry per candidate, in
    /// the order they were considered.
    #[error("All backends exhausted: [{}]", format_failures(.failures))]
    AllBackendsExhausted { failures: Vec<AttemptFailure> },
}

impl RoutingError {
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            RoutingError::AllBackendsExhausted { failures } => failures,
        }
    }
}

fn format_failures(failures: &[AttemptFailure]) -> String {
    if failures.is_empty() {
        return "no backends registered".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Backend agent abstraction layer.
//!
//! This module provides the `ChatAgent` trait and supporting types that abstract
//! vendor-specific logic for availability checks and chat inference.

use async_trait::async_trait;

pub mod error;
pub mod factory;
pub mod google;
pub mod huggingface;
pub mod openai;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

// Re-export key types for convenience
pub use error::{AgentError, FailureKind};
pub use types::{AgentCapabilities, AgentProfile, ChatTurn, ModelResponse, Role, TokenCount};

use crate::style::StyleConfig;

/// Uniform capability contract every remote model integration satisfies.
///
/// Encapsulates vendor HTTP protocols, response parsing, and credential
/// handling. The router never branches on the concrete agent type.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn ChatAgent>`.
///
/// # Cancellation Safety
///
/// `send` is cancellation-safe. Dropping the future aborts the in-flight
/// HTTP request; nothing is recorded for a dropped call.
#[async_trait]
pub trait ChatAgent: Send + Sync + 'static {
    /// Backend name, unique within a registry (e.g., "gemini").
    fn name(&self) -> &str;

    /// Agent profile with type, upstream model, and capabilities.
    fn profile(&self) -> AgentProfile;

    /// Whether the backend is configured to serve requests right now.
    ///
    /// Must be side-effect-free and cheap; it is called on every routing pass.
    fn is_available(&self) -> bool;

    /// Generate a reply to `conversation` in the given style.
    ///
    /// # Returns
    ///
    /// - `Ok(ModelResponse)` on success
    /// - `Err(AgentError::Unavailable)` if no credential is configured
    /// - `Err(AgentError::RateLimited)` if the upstream quota is exhausted
    /// - `Err(AgentError::Network | Timeout | Upstream)` for retryable failures
    /// - `Err(AgentError::InvalidResponse)` if the payload is malformed
    async fn send(
        &self,
        conversation: &[ChatTurn],
        style: &StyleConfig,
    ) -> Result<ModelResponse, AgentError>;
}

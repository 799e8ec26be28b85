//! Supporting types for agent operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// One role-tagged text turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Metadata describing an agent's type, upstream model, and capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Backend type string (e.g., "gemini", "huggingface", "openai").
    pub backend_type: String,

    /// Upstream model identifier (e.g., "gemini-1.5-flash").
    pub model_id: String,

    /// Capability flags for this agent.
    pub capabilities: AgentCapabilities,
}

/// Capability flags for agent features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCapabilities {
    /// Maximum output tokens requested from the upstream.
    pub max_tokens: u32,

    /// Whether the style system prompt is injected into the conversation.
    pub supports_style_injection: bool,

    /// Whether the backend refuses to serve without a credential.
    pub requires_api_key: bool,
}

impl Default for AgentCapabilities {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            supports_style_injection: true,
            requires_api_key: true,
        }
    }
}

/// Token count with accuracy indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "accuracy", content = "value", rename_all = "snake_case")]
pub enum TokenCount {
    /// Exact count reported by the upstream.
    Exact(u32),

    /// Heuristic estimate (chars / 4).
    Heuristic(u32),
}

impl TokenCount {
    pub fn estimate(text: &str) -> Self {
        TokenCount::Heuristic((text.chars().count() / 4) as u32)
    }

    pub fn value(&self) -> u32 {
        match self {
            TokenCount::Exact(n) => *n,
            TokenCount::Heuristic(n) => *n,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, TokenCount::Exact(_))
    }
}

/// Result of one successful backend invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Identifier the feedback surface uses to reference this response.
    pub message_id: String,

    /// Name of the backend that produced the response.
    pub backend: String,

    /// Response text.
    pub content: String,

    /// Wall-clock latency of the upstream call in seconds.
    pub latency_seconds: f64,

    /// Completion token count, when known.
    pub tokens: Option<TokenCount>,

    /// Upstream finish reason, normalized to lowercase.
    pub finish_reason: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl ModelResponse {
    pub fn new(backend: impl Into<String>, content: impl Into<String>, latency_seconds: f64) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            backend: backend.into(),
            content: content.into(),
            latency_seconds,
            tokens: None,
            finish_reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_tokens(mut self, tokens: TokenCount) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }
}

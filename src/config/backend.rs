//! Backend configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Backend vendor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    Gemini,
    HuggingFace,
    OpenAI,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Gemini => "gemini",
            BackendType::HuggingFace => "huggingface",
            BackendType::OpenAI => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendType::Gemini => crate::agent::google::DEFAULT_MODEL,
            BackendType::HuggingFace => crate::agent::huggingface::DEFAULT_MODEL,
            BackendType::OpenAI => crate::agent::openai::DEFAULT_MODEL,
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            BackendType::Gemini => crate::agent::google::DEFAULT_BASE_URL,
            BackendType::HuggingFace => crate::agent::huggingface::DEFAULT_BASE_URL,
            BackendType::OpenAI => crate::agent::openai::DEFAULT_BASE_URL,
        }
    }

    /// Vendor free-tier budget: (requests per minute, requests per day).
    pub fn default_limits(&self) -> (u32, u32) {
        match self {
            BackendType::Gemini => (15, 1500),
            BackendType::HuggingFace => (100, 1000),
            BackendType::OpenAI => (60, 10_000),
        }
    }

    pub fn default_max_tokens(&self) -> u32 {
        match self {
            BackendType::HuggingFace => 1024,
            _ => 2048,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, BackendType::HuggingFace)
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub backend_type: BackendType,
    /// Upstream model identifier; vendor default when absent
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL; vendor default when absent
    #[serde(default)]
    pub url: Option<String>,
    /// Lower = tried earlier
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
    #[serde(default)]
    pub requests_per_day: Option<u32>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_true")]
    pub supports_style_injection: bool,
}

fn default_priority() -> i32 {
    50
}

fn default_timeout_seconds() -> u64 {
    8
}

fn default_true() -> bool {
    true
}

impl BackendConfig {
    pub fn new(name: impl Into<String>, backend_type: BackendType) -> Self {
        Self {
            name: name.into(),
            backend_type,
            model: None,
            url: None,
            priority: default_priority(),
            api_key_env: None,
            requests_per_minute: None,
            requests_per_day: None,
            timeout_seconds: default_timeout_seconds(),
            max_tokens: None,
            supports_style_injection: true,
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend_type.default_model())
    }

    pub fn url(&self) -> &str {
        self.url
            .as_deref()
            .unwrap_or_else(|| self.backend_type.default_url())
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
            .unwrap_or(self.backend_type.default_limits().0)
    }

    pub fn requests_per_day(&self) -> u32 {
        self.requests_per_day
            .unwrap_or(self.backend_type.default_limits().1)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
            .unwrap_or_else(|| self.backend_type.default_max_tokens())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Resolve the credential from `api_key_env`, if set and present.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|v| !v.trim().is_empty())
    }
}

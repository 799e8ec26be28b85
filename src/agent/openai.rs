//! OpenAI-compatible agent implementation.

use super::{
    AgentCapabilities, AgentError, AgentProfile, ChatAgent, ChatTurn, ModelResponse, TokenCount,
};
use crate::style::StyleConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible agent.
///
/// Handles any chat completions API with Bearer authentication:
/// - Chat via POST /v1/chat/completions
pub struct OpenAIAgent {
    name: String,
    model_id: String,
    /// Base URL (e.g., "https://api.openai.com")
    base_url: String,
    /// API key for Bearer authentication
    api_key: Option<String>,
    capabilities: AgentCapabilities,
    timeout: Duration,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
}

impl OpenAIAgent {
    pub fn new(
        name: String,
        model_id: String,
        base_url: String,
        api_key: Option<String>,
        client: Arc<Client>,
    ) -> Self {
        Self {
            name,
            model_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            capabilities: AgentCapabilities::default(),
            timeout: Duration::from_secs(8),
            client,
        }
    }

    pub fn with_capabilities(mut self, capabilities: AgentCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    completion_tokens: u32,
}

#[async_trait]
impl ChatAgent for OpenAIAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "openai".to_string(),
            model_id: self.model_id.clone(),
            capabilities: self.capabilities.clone(),
        }
    }

    fn is_available(&self) -> bool {
        !self.capabilities.requires_api_key || self.api_key.is_some()
    }

    async fn send(
        &self,
        conversation: &[ChatTurn],
        style: &StyleConfig,
    ) -> Result<ModelResponse, AgentError> {
        if !self.is_available() {
            return Err(AgentError::Unavailable(
                "OpenAI API key not configured".to_string(),
            ));
        }

        let url = format!("{}/v1/chat/completions", self.base_url);
        let turns = if self.capabilities.supports_style_injection {
            style.apply(conversation)
        } else {
            conversation.to_vec()
        };

        let request = CompletionRequest {
            model: &self.model_id,
            messages: turns
                .into_iter()
                .map(|t| CompletionMessage {
                    role: t.role.to_string(),
                    content: Some(t.content),
                })
                .collect(),
            temperature: style.temperature,
            max_tokens: self.capabilities.max_tokens,
        };

        let timeout_ms = self.timeout.as_millis() as u64;
        let mut builder = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| AgentError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::from_status(status.as_u16(), error_body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AgentError::from_reqwest(e, timeout_ms))?;
        let latency_seconds = start.elapsed().as_secs_f64();

        let completion: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse completion response: {}", e))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::InvalidResponse("No choices in response".to_string()))?;

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AgentError::InvalidResponse("Empty message content".to_string()))?;

        let tokens = completion
            .usage
            .map(|u| TokenCount::Exact(u.completion_tokens))
            .unwrap_or_else(|| TokenCount::estimate(&content));

        let mut reply = ModelResponse::new(&self.name, content, latency_seconds).with_tokens(tokens);
        if let Some(reason) = choice.finish_reason {
            reply = reply.with_finish_reason(reason);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_follows_key() {
        let client = Arc::new(Client::new());
        let without = OpenAIAgent::new(
            "openai".into(),
            DEFAULT_MODEL.into(),
            DEFAULT_BASE_URL.into(),
            None,
            client.clone(),
        );
        assert!(!without.is_available());

        let with = OpenAIAgent::new(
            "openai".into(),
            DEFAULT_MODEL.into(),
            DEFAULT_BASE_URL.into(),
            Some("sk-test".into()),
            client,
        );
        assert!(with.is_available());
        assert_eq!(with.profile().backend_type, "openai");
    }
}

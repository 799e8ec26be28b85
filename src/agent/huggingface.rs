//! Hugging Face Inference API agent implementation.

use super::{
    AgentCapabilities, AgentError, AgentProfile, ChatAgent, ChatTurn, ModelResponse, Role,
    TokenCount,
};
use crate::style::StyleConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default Inference API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Default conversational model.
pub const DEFAULT_MODEL: &str = "microsoft/DialoGPT-large";

/// Number of trailing turns kept in the flattened prompt.
const CONTEXT_TURNS: usize = 6;

/// Hugging Face text-generation agent.
///
/// Flattens the conversation into a `Human:`/`Assistant:` transcript and posts
/// it to /models/{model}. The token is optional: anonymous access works at a
/// lower upstream quota.
pub struct HuggingFaceAgent {
    name: String,
    model_id: String,
    base_url: String,
    api_token: Option<String>,
    capabilities: AgentCapabilities,
    timeout: Duration,
    client: Arc<Client>,
}

impl HuggingFaceAgent {
    pub fn new(
        name: String,
        model_id: String,
        base_url: String,
        api_token: Option<String>,
        client: Arc<Client>,
    ) -> Self {
        Self {
            name,
            model_id,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.trim().is_empty()),
            capabilities: AgentCapabilities {
                max_tokens: 1024,
                supports_style_injection: true,
                requires_api_key: false,
            },
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

    /// Build the flattened prompt from the most recent turns.
    fn format_prompt(&self, conversation: &[ChatTurn], style: &StyleConfig) -> String {
        let mut parts = Vec::new();

        if self.capabilities.supports_style_injection {
            parts.push(style.system_prompt.clone());
        }

        let start = conversation.len().saturating_sub(CONTEXT_TURNS);
        for turn in &conversation[start..] {
            match turn.role {
                Role::User => parts.push(format!("Human: {}", turn.content)),
                Role::Assistant => parts.push(format!("Assistant: {}", turn.content)),
                Role::System => {}
            }
        }

        if parts.is_empty() {
            parts.push("Human: Hello".to_string());
        }
        parts.push("Assistant:".to_string());
        parts.join("\n\n")
    }

    /// Strip echoed prompt text and any hallucinated follow-up turn.
    fn clean_response(generated: &str, prompt: &str) -> String {
        let text = generated.strip_prefix(prompt).unwrap_or(generated);
        let text = text.split("\nHuman:").next().unwrap_or(text);
        text.trim().trim_start_matches("Assistant:").trim().to_string()
    }
}

#[derive(Debug, Serialize)]
struct HfRequest<'a> {
    inputs: &'a str,
    parameters: HfParameters,
}

#[derive(Debug, Serialize)]
struct HfParameters {
    max_new_tokens: u32,
    temperature: f32,
    do_sample: bool,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct HfGeneration {
    generated_text: Option<String>,
}

#[async_trait]
impl ChatAgent for HuggingFaceAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "huggingface".to_string(),
            model_id: self.model_id.clone(),
            capabilities: self.capabilities.clone(),
        }
    }

    fn is_available(&self) -> bool {
        !self.capabilities.requires_api_key || self.api_token.is_some()
    }

    async fn send(
        &self,
        conversation: &[ChatTurn],
        style: &StyleConfig,
    ) -> Result<ModelResponse, AgentError> {
        if !self.is_available() {
            return Err(AgentError::Unavailable(
                "Hugging Face API token not configured".to_string(),
            ));
        }

        let url = format!("{}/models/{}", self.base_url, self.model_id);
        let prompt = self.format_prompt(conversation, style);
        let payload = HfRequest {
            inputs: &prompt,
            parameters: HfParameters {
                max_new_tokens: self.capabilities.max_tokens,
                temperature: style.temperature,
                do_sample: true,
                return_full_text: false,
            },
        };

        tracing::debug!(
            backend = %self.name,
            model = %self.model_id,
            prompt_chars = prompt.len(),
            "initiating huggingface request"
        );

        let timeout_ms = self.timeout.as_millis() as u64;
        let mut request = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&payload)
            .timeout(self.timeout);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| AgentError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(AgentError::from_status(status.as_u16(), message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AgentError::from_reqwest(e, timeout_ms))?;
        let latency_seconds = start.elapsed().as_secs_f64();

        let generations: Vec<HfGeneration> = serde_json::from_str(&body).map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse Hugging Face response: {}", e))
        })?;

        let generated = generations
            .into_iter()
            .next()
            .and_then(|g| g.generated_text)
            .ok_or_else(|| {
                AgentError::InvalidResponse("No generated_text in response".to_string())
            })?;

        let content = Self::clean_response(&generated, &prompt);
        if content.is_empty() {
            return Err(AgentError::InvalidResponse(
                "Empty generation from Hugging Face".to_string(),
            ));
        }

        let tokens = TokenCount::estimate(&content);
        Ok(ModelResponse::new(&self.name, content, latency_seconds).with_tokens(tokens))
    }
}

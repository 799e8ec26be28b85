//! Google Gemini agent implementation.

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

/// Default Generative Language API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google Gemini agent.
///
/// Translates the conversation into the Generative Language API format:
/// - Chat via POST /v1beta/models/{model}:generateContent?key={key}
/// - System turns folded into the `systemInstruction` field
/// - Role mapping: assistant -> model
pub struct GeminiAgent {
    name: String,
    model_id: String,
    /// Base URL (e.g., "https://generativelanguage.googleapis.com")
    base_url: String,
    /// API key for query parameter authentication; `None` disables the agent.
    api_key: Option<String>,
    capabilities: AgentCapabilities,
    timeout: Duration,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
}

impl GeminiAgent {
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

    /// Translate the styled conversation to Gemini format.
    fn translate_request(&self, conversation: &[ChatTurn], style: &StyleConfig) -> GoogleRequest {
        let turns = if self.capabilities.supports_style_injection {
            style.apply(conversation)
        } else {
            conversation.to_vec()
        };

        let system_messages: Vec<&str> = turns
            .iter()
            .filter(|t| t.role == Role::System)
            .map(|t| t.content.as_str())
            .collect();

        let system_instruction = if system_messages.is_empty() {
            None
        } else {
            Some(GoogleSystemInstruction {
                parts: vec![GooglePart {
                    text: system_messages.join("\n"),
                }],
            })
        };

        let contents = turns
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|t| GoogleContent {
                role: match t.role {
                    Role::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                },
                parts: vec![GooglePart {
                    text: t.content.clone(),
                }],
            })
            .collect();

        GoogleRequest {
            contents,
            system_instruction,
            generation_config: Some(GoogleGenerationConfig {
                temperature: Some(style.temperature),
                max_output_tokens: Some(self.capabilities.max_tokens as i32),
            }),
        }
    }

    /// Extract the reply from a Gemini response.
    fn translate_response(
        &self,
        response: GoogleResponse,
        latency_seconds: f64,
    ) -> Result<ModelResponse, AgentError> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| AgentError::InvalidResponse("No candidates in response".to_string()))?;

        let text = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AgentError::InvalidResponse(
                "Empty content in Gemini candidate".to_string(),
            ));
        }

        let finish = match candidate.finish_reason.as_deref() {
            Some("MAX_TOKENS") => "length",
            Some("SAFETY") | Some("RECITATION") => "content_filter",
            _ => "stop",
        };

        let tokens = response
            .usage_metadata
            .and_then(|u| u.candidates_token_count)
            .map(|n| TokenCount::Exact(n.max(0) as u32))
            .unwrap_or_else(|| TokenCount::estimate(&text));

        Ok(ModelResponse::new(&self.name, text.trim(), latency_seconds)
            .with_tokens(tokens)
            .with_finish_reason(finish))
    }
}

/// Gemini request format
#[derive(Debug, Serialize)]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "systemInstruction")]
    system_instruction: Option<GoogleSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "generationConfig")]
    generation_config: Option<GoogleGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoogleContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GoogleSystemInstruction {
    parts: Vec<GooglePart>,
}

#[derive(Debug, Serialize, Default)]
struct GoogleGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: Option<i32>,
}

/// Gemini response format
#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GoogleUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUsageMetadata {
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<i32>,
}

#[async_trait]
impl ChatAgent for GeminiAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "gemini".to_string(),
            model_id: self.model_id.clone(),
            capabilities: self.capabilities.clone(),
        }
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(
        &self,
        conversation: &[ChatTurn],
        style: &StyleConfig,
    ) -> Result<ModelResponse, AgentError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AgentError::Unavailable("Gemini API key not configured".to_string()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model_id
        );

        tracing::debug!(
            backend = %self.name,
            model = %self.model_id,
            turns = conversation.len(),
            "initiating gemini request"
        );

        let google_request = self.translate_request(conversation, style);
        let timeout_ms = self.timeout.as_millis() as u64;

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .header("content-type", "application/json")
            .json(&google_request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AgentError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(AgentError::from_status(status.as_u16(), message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AgentError::from_reqwest(e, timeout_ms))?;
        let latency_seconds = start.elapsed().as_secs_f64();

        let google_response: GoogleResponse = serde_json::from_str(&body).map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        self.translate_response(google_response, latency_seconds)
    }
}

//! Agent factory for creating ChatAgent trait objects from configuration.

use super::{
    google::GeminiAgent, huggingface::HuggingFaceAgent, openai::OpenAIAgent, AgentCapabilities,
    ChatAgent,
};
use crate::config::{BackendConfig, BackendType};
use reqwest::Client;
use std::sync::Arc;

/// Create an agent from backend configuration.
///
/// A missing credential is not an error: the agent is created and reports
/// `is_available() == false`, so the router skips it until the process is
/// restarted with the credential present.
///
/// # Examples
///
/// ```
/// use chatroute::agent::factory::create_agent;
/// use chatroute::config::{BackendConfig, BackendType};
/// use reqwest::Client;
/// use std::sync::Arc;
///
/// let client = Arc::new(Client::new());
/// let config = BackendConfig::new("dialogpt", BackendType::HuggingFace);
/// let agent = create_agent(&config, client);
///
/// assert_eq!(agent.name(), "dialogpt");
/// assert!(agent.is_available());
/// ```
pub fn create_agent(config: &BackendConfig, client: Arc<Client>) -> Arc<dyn ChatAgent> {
    let api_key = config.api_key();
    if api_key.is_none() && config.backend_type.requires_api_key() {
        tracing::warn!(
            backend = %config.name,
            api_key_env = ?config.api_key_env,
            "No API key configured, backend will be skipped"
        );
    }

    let capabilities = AgentCapabilities {
        max_tokens: config.max_tokens(),
        supports_style_injection: config.supports_style_injection,
        requires_api_key: config.backend_type.requires_api_key(),
    };
    let name = config.name.clone();
    let model = config.model().to_string();
    let url = config.url().to_string();

    match config.backend_type {
        BackendType::Gemini => Arc::new(
            GeminiAgent::new(name, model, url, api_key, client)
                .with_capabilities(capabilities)
                .with_timeout(config.timeout()),
        ),
        BackendType::HuggingFace => Arc::new(
            HuggingFaceAgent::new(name, model, url, api_key, client)
                .with_capabilities(capabilities)
                .with_timeout(config.timeout()),
        ),
        BackendType::OpenAI => Arc::new(
            OpenAIAgent::new(name, model, url, api_key, client)
                .with_capabilities(capabilities)
                .with_timeout(config.timeout()),
        ),
    }
}

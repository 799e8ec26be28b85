//! Shared test utilities for chatroute integration tests.
//!
//! Provides a scripted mock agent with call counters plus builders for
//! registries and fully wired services.

#![allow(dead_code)]

use async_trait::async_trait;
use chatroute::agent::{
    AgentCapabilities, AgentError, AgentProfile, ChatAgent, ChatTurn, ModelResponse,
};
use chatroute::api::{create_router, AppState};
use chatroute::config::{ChatrouteConfig, FeedbackConfig, RecommendationConfig};
use chatroute::feedback::{FeedbackKind, FeedbackRecord, FeedbackStore};
use chatroute::metrics::{detached_handle, MetricsCollector};
use chatroute::orchestrator::ChatService;
use chatroute::ratelimit::RateLimits;
use chatroute::registry::{Backend, Registry};
use chatroute::style::{ConversationStyle, StyleCatalog, StyleConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Mock Agent
// =============================================================================

#[derive(Debug, Clone)]
pub enum Behavior {
    Reply,
    Fail(AgentError),
    Hang(Duration),
}

/// In-process agent whose behavior can be changed between calls.
pub struct MockAgent {
    name: String,
    available: bool,
    latency_seconds: f64,
    behavior: Mutex<Behavior>,
    calls: AtomicUsize,
    last_style: Mutex<Option<StyleConfig>>,
}

impl MockAgent {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, true, Behavior::Reply))
    }

    pub fn failing(name: &str, error: AgentError) -> Arc<Self> {
        Arc::new(Self::build(name, true, Behavior::Fail(error)))
    }

    pub fn unavailable(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, false, Behavior::Reply))
    }

    pub fn hanging(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(name, true, Behavior::Hang(delay)))
    }

    fn build(name: &str, available: bool, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            available,
            latency_seconds: 0.5,
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
            last_style: Mutex::new(None),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_style(&self) -> Option<StyleConfig> {
        self.last_style.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatAgent for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "mock".to_string(),
            model_id: format!("{}-model", self.name),
            capabilities: AgentCapabilities::default(),
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn send(
        &self,
        _conversation: &[ChatTurn],
        style: &StyleConfig,
    ) -> Result<ModelResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_style.lock().unwrap() = Some(style.clone());

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Reply => Ok(ModelResponse::new(
                &self.name,
                format!("{} says hi", self.name),
                self.latency_seconds,
            )),
            Behavior::Fail(err) => Err(err),
            Behavior::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ModelResponse::new(&self.name, "late", delay.as_secs_f64()))
            }
        }
    }
}

// =============================================================================
// Builders
// =============================================================================

pub fn generous_limits() -> RateLimits {
    RateLimits::new(1_000, 100_000)
}

/// Register `agents` with priorities 1, 2, 3... in the order given.
pub fn registry_of(agents: &[Arc<MockAgent>]) -> Arc<Registry> {
    let registry = Arc::new(Registry::new());
    for (i, agent) in agents.iter().enumerate() {
        registry
            .add_backend(Backend::new(
                Arc::clone(agent) as Arc<dyn ChatAgent>,
                i as i32 + 1,
                generous_limits(),
            ))
            .unwrap();
    }
    registry
}

pub fn service_over(registry: Arc<Registry>) -> ChatService {
    service_with(registry, Arc::new(FeedbackStore::in_memory(FeedbackConfig::default())))
}

pub fn service_with(registry: Arc<Registry>, feedback: Arc<FeedbackStore>) -> ChatService {
    ChatService::new(
        registry,
        feedback,
        StyleCatalog::default(),
        RecommendationConfig::default(),
    )
}

pub fn app_over(registry: Arc<Registry>) -> axum::Router {
    let service = Arc::new(service_over(Arc::clone(&registry)));
    let metrics = Arc::new(MetricsCollector::new(registry, detached_handle()));
    create_router(Arc::new(AppState::new(
        service,
        metrics,
        Arc::new(ChatrouteConfig::default()),
    )))
}

pub fn user(text: &str) -> Vec<ChatTurn> {
    vec![ChatTurn::user(text)]
}

pub fn rating(backend: &str, style: ConversationStyle, value: u8, latency: f64) -> FeedbackRecord {
    FeedbackRecord::new(
        uuid::Uuid::new_v4().to_string(),
        "conv-1",
        FeedbackKind::Rating { value },
        backend,
        style,
    )
    .with_latency(latency)
}

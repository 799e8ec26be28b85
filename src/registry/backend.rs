use crate::agent::{AgentCapabilities, ChatAgent};
use crate::ratelimit::{RateLimitSnapshot, RateLimiter, RateLimits};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default per-call deadline when none is configured.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(8);

/// A registered chat backend.
///
/// Wraps the agent that talks to the vendor together with the budget that
/// gates it. Configuration fields are immutable after registration; runtime
/// counters are atomics so the router can update them through a shared `Arc`.
///
/// # Examples
///
/// ```
/// use chatroute::agent::factory::create_agent;
/// use chatroute::config::{BackendConfig, BackendType};
/// use chatroute::ratelimit::RateLimits;
/// use chatroute::registry::Backend;
/// use std::sync::Arc;
///
/// let config = BackendConfig::new("dialogpt", BackendType::HuggingFace);
/// let agent = create_agent(&config, Arc::new(reqwest::Client::new()));
/// let backend = Backend::new(agent, 10, RateLimits::new(100, 1000));
///
/// assert_eq!(backend.name, "dialogpt");
/// assert_eq!(backend.priority, 10);
/// ```
pub struct Backend {
    /// Unique name, stable for the process lifetime
    pub name: String,
    /// Vendor type reported by the agent (e.g., "gemini")
    pub backend_type: String,
    /// Upstream model identifier
    pub model_id: String,
    /// Priority for routing (lower = tried earlier)
    pub priority: i32,
    /// Position in registration sequence, assigned by the registry
    pub registration_order: u64,
    /// Per-call deadline enforced by the router
    pub timeout: Duration,
    pub capabilities: AgentCapabilities,
    agent: Arc<dyn ChatAgent>,
    limiter: RateLimiter,
    /// Lifetime calls dispatched to the agent (atomic)
    pub total_requests: AtomicU64,
    /// Lifetime calls that ended in a failure (atomic)
    pub total_failures: AtomicU64,
    /// Rolling average latency in milliseconds (atomic, EMA with α=0.2)
    pub avg_latency_ms: AtomicU32,
}

impl Backend {
    /// Create a backend around an agent.
    ///
    /// Counters start at 0, registration order is assigned on insertion.
    pub fn new(agent: Arc<dyn ChatAgent>, priority: i32, limits: RateLimits) -> Self {
        let profile = agent.profile();
        Self {
            name: agent.name().to_string(),
            backend_type: profile.backend_type,
            model_id: profile.model_id,
            priority,
            registration_order: 0,
            timeout: DEFAULT_BACKEND_TIMEOUT,
            capabilities: profile.capabilities,
            agent,
            limiter: RateLimiter::new(limits),
            total_requests: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            avg_latency_ms: AtomicU32::new(0),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn agent(&self) -> &Arc<dyn ChatAgent> {
        &self.agent
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn is_available(&self) -> bool {
        self.agent.is_available()
    }

    /// Record a completed call's latency and bump the request counter.
    pub fn record_success(&self, latency_ms: u32) {
        self.total_requests.fetch_add(1, Ordering::SeqCst);
        self.update_latency(latency_ms);
    }

    pub fn record_failure(&self) {
        self.total_requests.fetch_add(1, Ordering::SeqCst);
        self.total_failures.fetch_add(1, Ordering::SeqCst);
    }

    fn update_latency(&self, latency_ms: u32) {
        // First sample seeds the average; later ones blend in at α=0.2.
        let _ = self
            .avg_latency_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                if current == 0 {
                    Some(latency_ms)
                } else {
                    Some(((latency_ms as u64 + 4 * current as u64) / 5) as u32)
                }
            });
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("backend_type", &self.backend_type)
            .field("priority", &self.priority)
            .field("registration_order", &self.registration_order)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Serializable view of Backend (atomic fields converted to regular values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendView {
    pub name: String,
    pub backend_type: String,
    pub model_id: String,
    pub priority: i32,
    pub available: bool,
    pub timeout_ms: u64,
    pub capabilities: AgentCapabilities,
    pub rate_limit: RateLimitSnapshot,
    pub total_requests: u64,
    pub total_failures: u64,
    pub avg_latency_ms: u32,
}

impl From<&Backend> for BackendView {
    fn from(backend: &Backend) -> Self {
        Self {
            name: backend.name.clone(),
            backend_type: backend.backend_type.clone(),
            model_id: backend.model_id.clone(),
            priority: backend.priority,
            available: backend.is_available(),
            timeout_ms: backend.timeout.as_millis() as u64,
            capabilities: backend.capabilities.clone(),
            rate_limit: backend.limiter.snapshot(),
            total_requests: backend.total_requests.load(Ordering::SeqCst),
            total_failures: backend.total_failures.load(Ordering::SeqCst),
            avg_latency_ms: backend.avg_latency_ms.load(Ordering::SeqCst),
        }
    }
}

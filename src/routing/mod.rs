//! Fallback routing across registered backends.
//!
//! The router walks a candidate list once, in order, skipping backends that
//! are unconfigured or over budget, and returns the first successful reply.
//! Each candidate contributes exactly one [`AttemptFailure`] when it does not
//! serve the request, so an exhausted chain explains itself.

use std::sync::Arc;
use std::time::Instant;

pub mod error;

pub use error::{AttemptFailure, RoutingError};

use crate::agent::{AgentError, ChatTurn, FailureKind, ModelResponse};
use crate::registry::{Backend, Registry};
use crate::style::StyleConfig;
use serde::Serialize;

/// Successful outcome of one routed chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingResult {
    pub response: ModelResponse,
    /// Name of the backend that produced the reply
    pub backend_used: String,
    /// True when at least one earlier candidate was skipped or failed
    pub fallback_used: bool,
    /// Candidates that did not serve the request before the winner
    pub failures: Vec<AttemptFailure>,
}

/// Router executes a chat turn against the registry's backends
pub struct Router {
    registry: Arc<Registry>,
}

impl Router {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Candidate order for one call.
    ///
    /// A registered `preferred` backend goes first and is excluded from the
    /// tail; an unknown one is ignored. The rest follow default priority.
    pub fn candidate_order(&self, preferred: Option<&str>) -> Vec<Arc<Backend>> {
        let mut ordered = self.registry.priority_order();
        if let Some(name) = preferred {
            if let Some(pos) = ordered.iter().position(|b| b.name == name) {
                let first = ordered.remove(pos);
                ordered.insert(0, first);
            } else {
                tracing::debug!(preferred = %name, "preferred backend not registered, ignoring");
            }
        }
        ordered
    }

    /// Serve `conversation` with the first candidate that succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::AllBackendsExhausted` with one failure per
    /// candidate when no backend produced a reply.
    pub async fn select_and_execute(
        &self,
        conversation: &[ChatTurn],
        style: &StyleConfig,
        preferred: Option<&str>,
    ) -> Result<RoutingResult, RoutingError> {
        let candidates = self.candidate_order(preferred);
        let style_label = style.style.as_str();
        let mut failures: Vec<AttemptFailure> = Vec::with_capacity(candidates.len());
        let first_candidate = candidates.first().map(|b| b.name.clone());

        for backend in &candidates {
            if !backend.is_available() {
                tracing::debug!(backend = %backend.name, "backend not configured, skipping");
                failures.push(AttemptFailure::new(
                    &backend.name,
                    FailureKind::Unavailable,
                    "backend not configured",
                ));
                continue;
            }

            if !backend.limiter().try_acquire() {
                tracing::warn!(
                    backend = %backend.name,
                    reason = "local budget exhausted",
                    "rate limit reached, skipping backend"
                );
                record_failure_metric(&backend.name, FailureKind::RateLimited);
                failures.push(AttemptFailure::new(
                    &backend.name,
                    FailureKind::RateLimited,
                    "local rate limit budget exhausted",
                ));
                continue;
            }

            match self.invoke(backend, conversation, style).await {
                Ok(response) => {
                    let fallback_used = !failures.is_empty();
                    let latency_ms = (response.latency_seconds * 1000.0) as u64;

                    metrics::counter!(
                        "chatroute_requests_total",
                        "backend" => backend.name.clone(),
                        "style" => style_label,
                        "status" => "success"
                    )
                    .increment(1);
                    metrics::histogram!(
                        "chatroute_request_duration_seconds",
                        "backend" => backend.name.clone()
                    )
                    .record(response.latency_seconds);

                    if fallback_used {
                        if let Some(from) = &first_candidate {
                            metrics::counter!(
                                "chatroute_fallbacks_total",
                                "from" => from.clone(),
                                "to" => backend.name.clone()
                            )
                            .increment(1);
                        }
                    }

                    tracing::info!(
                        backend = %backend.name,
                        style = %style_label,
                        latency_ms,
                        fallback_used,
                        skipped = failures.len(),
                        "chat turn served"
                    );

                    return Ok(RoutingResult {
                        response,
                        backend_used: backend.name.clone(),
                        fallback_used,
                        failures,
                    });
                }
                Err(e) => {
                    let kind = e.kind();
                    log_attempt_failure(&backend.name, &e);
                    // Missing credentials are configuration, not an operational failure.
                    if kind != FailureKind::Unavailable {
                        record_failure_metric(&backend.name, kind);
                        metrics::counter!(
                            "chatroute_requests_total",
                            "backend" => backend.name.clone(),
                            "style" => style_label,
                            "status" => "error"
                        )
                        .increment(1);
                    }
                    failures.push(AttemptFailure::new(&backend.name, kind, e.to_string()));
                }
            }
        }

        tracing::error!(
            style = %style_label,
            candidates = candidates.len(),
            reasons = ?failures.iter().map(|f| f.kind.as_str()).collect::<Vec<_>>(),
            "all backends exhausted"
        );
        metrics::counter!("chatroute_exhausted_total", "style" => style_label).increment(1);

        Err(RoutingError::AllBackendsExhausted { failures })
    }

    /// One bounded call to a backend, with runtime counters updated.
    async fn invoke(
        &self,
        backend: &Backend,
        conversation: &[ChatTurn],
        style: &StyleConfig,
    ) -> Result<ModelResponse, AgentError> {
        let start = Instant::now();
        let result =
            match tokio::time::timeout(backend.timeout, backend.agent().send(conversation, style))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(AgentError::Timeout(backend.timeout.as_millis() as u64)),
            };

        match &result {
            Ok(_) => backend.record_success(start.elapsed().as_millis() as u32),
            Err(e) if e.kind() == FailureKind::Unavailable => {}
            Err(_) => backend.record_failure(),
        }
        result
    }
}

fn log_attempt_failure(backend: &str, error: &AgentError) {
    match error.kind() {
        FailureKind::Unavailable => {
            tracing::debug!(backend = %backend, error = %error, "backend unavailable, skipping");
        }
        FailureKind::RateLimited => {
            tracing::warn!(backend = %backend, error = %error, "upstream quota exhausted, falling back");
        }
        FailureKind::Transient => {
            tracing::warn!(backend = %backend, error = %error, "transient backend failure, falling back");
        }
        FailureKind::InvalidResponse => {
            tracing::warn!(
                backend = %backend,
                error = %error,
                data_quality = true,
                "malformed backend response, falling back"
            );
        }
    }
}

fn record_failure_metric(backend: &str, kind: FailureKind) {
    metrics::counter!(
        "chatroute_backend_failures_total",
        "backend" => backend.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::{CallLog, ScriptedAgent};
    use crate::ratelimit::RateLimits;
    use crate::style::ConversationStyle;
    use std::sync::Mutex;
    use std::time::Duration;

    fn style() -> StyleConfig {
        ConversationStyle::Helpful.default_config()
    }

    fn conversation() -> Vec<ChatTurn> {
        vec![ChatTurn::user("hello")]
    }

    fn register(registry: &Registry, agent: Arc<ScriptedAgent>, priority: i32) {
        registry
            .add_backend(Backend::new(agent, priority, RateLimits::new(10, 100)))
            .unwrap();
    }

    #[test]
    fn candidate_order_moves_preferred_to_front() {
        let registry = Arc::new(Registry::new());
        register(&registry, Arc::new(ScriptedAgent::ok("a")), 1);
        register(&registry, Arc::new(ScriptedAgent::ok("b")), 2);
        register(&registry, Arc::new(ScriptedAgent::ok("c")), 3);
        let router = Router::new(registry);

        let names = |order: Vec<Arc<Backend>>| -> Vec<String> {
            order.into_iter().map(|b| b.name.clone()).collect()
        };
        assert_eq!(names(router.candidate_order(None)), vec!["a", "b", "c"]);
        assert_eq!(names(router.candidate_order(Some("c"))), vec!["c", "a", "b"]);
        assert_eq!(names(router.candidate_order(Some("nope"))), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn preferred_success_invokes_one_backend() {
        let registry = Arc::new(Registry::new());
        let a = Arc::new(ScriptedAgent::ok("a"));
        let b = Arc::new(ScriptedAgent::ok("b"));
        register(&registry, a.clone(), 1);
        register(&registry, b.clone(), 2);
        let router = Router::new(registry);

        let result = router
            .select_and_execute(&conversation(), &style(), Some("b"))
            .await
            .unwrap();

        assert_eq!(result.backend_used, "b");
        assert!(!result.fallback_used);
        assert_eq!(b.calls(), 1);
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn transient_failure_falls_back_in_priority_order() {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(Registry::new());
        let primary = Arc::new(
            ScriptedAgent::failing("gemini", AgentError::Network("connection reset".into()))
                .with_log(log.clone()),
        );
        let secondary = Arc::new(ScriptedAgent::ok("dialogpt").with_log(log.clone()));
        let tertiary = Arc::new(ScriptedAgent::ok("openai").with_log(log.clone()));
        register(&registry, primary.clone(), 1);
        register(&registry, secondary.clone(), 2);
        register(&registry, tertiary.clone(), 3);
        let router = Router::new(registry);

        let result = router
            .select_and_execute(&conversation(), &style(), Some("gemini"))
            .await
            .unwrap();

        assert_eq!(result.backend_used, "dialogpt");
        assert!(result.fallback_used);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].kind, FailureKind::Transient);
        assert_eq!(*log.lock().unwrap(), vec!["gemini", "dialogpt"]);
        assert_eq!(tertiary.calls(), 0);
    }

    #[tokio::test]
    async fn unavailable_and_rate_limited_backends_are_never_invoked() {
        let registry = Arc::new(Registry::new());
        let unconfigured = Arc::new(ScriptedAgent::unavailable("gemini"));
        let throttled = Arc::new(ScriptedAgent::ok("openai"));
        let fallback = Arc::new(ScriptedAgent::ok("dialogpt"));
        register(&registry, unconfigured.clone(), 1);
        registry
            .add_backend(Backend::new(throttled.clone(), 2, RateLimits::new(0, 100)))
            .unwrap();
        register(&registry, fallback.clone(), 3);
        let router = Router::new(registry);

        let result = router
            .select_and_execute(&conversation(), &style(), None)
            .await
            .unwrap();

        assert_eq!(result.backend_used, "dialogpt");
        assert_eq!(unconfigured.calls(), 0);
        assert_eq!(throttled.calls(), 0);
        let kinds: Vec<FailureKind> = result.failures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FailureKind::Unavailable, FailureKind::RateLimited]);
    }

    #[tokio::test]
    async fn rejected_credentials_are_skipped_without_counting_a_failure() {
        let registry = Arc::new(Registry::new());
        let revoked = Arc::new(ScriptedAgent::failing(
            "gemini",
            AgentError::Unavailable("403: key revoked".to_string()),
        ));
        let flaky = Arc::new(ScriptedAgent::failing(
            "openai",
            AgentError::Network("reset".to_string()),
        ));
        let fallback = Arc::new(ScriptedAgent::ok("dialogpt"));
        register(&registry, revoked.clone(), 1);
        register(&registry, flaky.clone(), 2);
        register(&registry, fallback, 3);
        let router = Router::new(Arc::clone(&registry));

        let result = router
            .select_and_execute(&conversation(), &style(), None)
            .await
            .unwrap();

        assert_eq!(result.backend_used, "dialogpt");
        assert_eq!(revoked.calls(), 1);
        let kinds: Vec<FailureKind> = result.failures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FailureKind::Unavailable, FailureKind::Transient]);

        let failures = |name: &str| {
            registry
                .get_backend(name)
                .unwrap()
                .total_failures
                .load(std::sync::atomic::Ordering::SeqCst)
        };
        assert_eq!(failures("gemini"), 0);
        assert_eq!(failures("openai"), 1);
    }

    #[tokio::test]
    async fn exhaustion_records_one_reason_per_backend() {
        let registry = Arc::new(Registry::new());
        register(&registry, Arc::new(ScriptedAgent::unavailable("a")), 1);
        register(
            &registry,
            Arc::new(ScriptedAgent::failing("b", AgentError::RateLimited("quota".into()))),
            2,
        );
        register(
            &registry,
            Arc::new(ScriptedAgent::failing(
                "c",
                AgentError::InvalidResponse("no candidates".into()),
            )),
            3,
        );
        register(
            &registry,
            Arc::new(ScriptedAgent::failing(
                "d",
                AgentError::Upstream {
                    status: 503,
                    message: "loading".into(),
                },
            )),
            4,
        );
        let router = Router::new(registry);

        let err = router
            .select_and_execute(&conversation(), &style(), None)
            .await
            .unwrap_err();

        let failures = err.failures();
        assert_eq!(failures.len(), 4);
        let backends: Vec<&str> = failures.iter().map(|f| f.backend.as_str()).collect();
        assert_eq!(backends, vec!["a", "b", "c", "d"]);
        let kinds: Vec<FailureKind> = failures.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FailureKind::Unavailable,
                FailureKind::RateLimited,
                FailureKind::InvalidResponse,
                FailureKind::Transient,
            ]
        );
    }

    #[tokio::test]
    async fn empty_registry_is_exhausted() {
        let router = Router::new(Arc::new(Registry::new()));
        let err = router
            .select_and_execute(&conversation(), &style(), None)
            .await
            .unwrap_err();
        assert!(err.failures().is_empty());
    }

    #[tokio::test]
    async fn slow_backend_times_out_as_transient() {
        let registry = Arc::new(Registry::new());
        let slow = Arc::new(ScriptedAgent::ok("slow").with_delay(Duration::from_millis(200)));
        registry
            .add_backend(
                Backend::new(slow.clone(), 1, RateLimits::new(10, 100))
                    .with_timeout(Duration::from_millis(20)),
            )
            .unwrap();
        register(&registry, Arc::new(ScriptedAgent::ok("fast")), 2);
        let router = Router::new(registry.clone());

        let result = router
            .select_and_execute(&conversation(), &style(), None)
            .await
            .unwrap();

        assert_eq!(result.backend_used, "fast");
        assert_eq!(result.failures[0].kind, FailureKind::Transient);
        assert!(result.failures[0].message.contains("timeout"));
        let slow_backend = registry.get_backend("slow").unwrap();
        assert_eq!(
            slow_backend
                .total_failures
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[tokio::test]
    async fn each_attempt_consumes_budget() {
        let registry = Arc::new(Registry::new());
        let agent = Arc::new(ScriptedAgent::ok("only"));
        registry
            .add_backend(Backend::new(agent.clone(), 1, RateLimits::new(2, 100)))
            .unwrap();
        let router = Router::new(registry);

        assert!(router.select_and_execute(&conversation(), &style(), None).await.is_ok());
        assert!(router.select_and_execute(&conversation(), &style(), None).await.is_ok());
        let err = router
            .select_and_execute(&conversation(), &style(), None)
            .await
            .unwrap_err();

        assert_eq!(err.failures()[0].kind, FailureKind::RateLimited);
        assert_eq!(agent.calls(), 2);
    }
}

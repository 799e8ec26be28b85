//! Orchestration facade.
//!
//! [`ChatService`] is the single entry point for the chat layer: it asks the
//! recommendation cache for a preferred backend, routes the turn with
//! fallback, and forwards the outcome to the feedback store's usage
//! counters. Feedback submission goes through here too so the cache entry
//! for the rated style is dropped immediately.

use crate::agent::{ChatTurn, FailureKind};
use crate::config::RecommendationConfig;
use crate::feedback::{
    Analytics, FeedbackError, FeedbackRecord, FeedbackStore, Insights, PerformanceAggregate,
    Recommendation, UsageView,
};
use crate::recommend::{RecommendationCache, RecommendationEntry};
use crate::registry::{BackendView, Registry};
use crate::routing::{AttemptFailure, Router, RoutingError, RoutingResult};
use crate::style::{ConversationStyle, StyleCatalog, StyleConfig};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Runtime snapshot for status endpoints and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub backends: Vec<BackendView>,
    pub recommendations: Vec<StyleRecommendation>,
    pub usage: Vec<UsageView>,
    pub feedback_records: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleRecommendation {
    pub style: ConversationStyle,
    #[serde(flatten)]
    pub entry: RecommendationEntry,
}

/// Lifecycle-scoped owner of the router, cache, and feedback store.
pub struct ChatService {
    registry: Arc<Registry>,
    router: Router,
    cache: RecommendationCache,
    feedback: Arc<FeedbackStore>,
    styles: StyleCatalog,
    started_at: DateTime<Utc>,
}

impl ChatService {
    pub fn new(
        registry: Arc<Registry>,
        feedback: Arc<FeedbackStore>,
        styles: StyleCatalog,
        recommendation: RecommendationConfig,
    ) -> Self {
        Self {
            router: Router::new(Arc::clone(&registry)),
            cache: RecommendationCache::new(
                Arc::clone(&feedback),
                Arc::clone(&registry),
                recommendation,
            ),
            registry,
            feedback,
            styles,
            started_at: Utc::now(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn feedback(&self) -> &Arc<FeedbackStore> {
        &self.feedback
    }

    pub fn recommendation_cache(&self) -> &RecommendationCache {
        &self.cache
    }

    pub fn style_config(&self, style: ConversationStyle) -> StyleConfig {
        self.styles.get(style)
    }

    /// Serve one chat turn in `style`.
    ///
    /// # Errors
    ///
    /// `RoutingError::AllBackendsExhausted` when no backend could reply; the
    /// caller degrades using the per-candidate reasons it carries.
    pub async fn handle_chat_turn(
        &self,
        conversation: &[ChatTurn],
        style: ConversationStyle,
    ) -> Result<RoutingResult, RoutingError> {
        let style_config = self.styles.get(style);
        let preferred = self.cache.get_preferred_backend(style);

        tracing::debug!(
            style = %style,
            preferred = ?preferred,
            turns = conversation.len(),
            "handling chat turn"
        );

        let result = self
            .router
            .select_and_execute(conversation, &style_config, preferred.as_deref())
            .await;

        match &result {
            Ok(routed) => {
                self.record_failed_attempts(&routed.failures, style);
                self.feedback.record_outcome(
                    &routed.backend_used,
                    style,
                    Some(routed.response.latency_seconds),
                    true,
                );
            }
            Err(err) => self.record_failed_attempts(err.failures(), style),
        }

        result
    }

    fn record_failed_attempts(&self, failures: &[AttemptFailure], style: ConversationStyle) {
        // Unconfigured backends were never attempted.
        for failure in failures.iter().filter(|f| f.kind != FailureKind::Unavailable) {
            self.feedback
                .record_outcome(&failure.backend, style, None, false);
        }
    }

    /// Record user feedback on an earlier response.
    ///
    /// Failures are returned to the caller and never affect chat serving.
    pub fn record_feedback(
        &self,
        record: FeedbackRecord,
    ) -> Result<PerformanceAggregate, FeedbackError> {
        let style = record.style;
        let updated = self.feedback.record_feedback(record)?;
        self.cache.invalidate(style);
        Ok(updated)
    }

    pub fn insights(&self) -> Result<Insights, FeedbackError> {
        self.feedback.generate_insights()
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.feedback.recommendations()
    }

    pub fn analytics(&self) -> Result<Analytics, FeedbackError> {
        self.feedback.analytics()
    }

    /// Preferred backend for every style, computing entries as needed.
    pub fn preferred_backends(&self) -> Vec<StyleRecommendation> {
        let now = Utc::now();
        ConversationStyle::ALL
            .iter()
            .filter_map(|style| {
                self.cache
                    .entry_at(*style, now)
                    .map(|entry| StyleRecommendation {
                        style: *style,
                        entry,
                    })
            })
            .collect()
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    pub fn status(&self) -> ServiceStatus {
        let now = Utc::now();
        let feedback_records = self.feedback.record_count().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not count feedback records");
            0
        });
        ServiceStatus {
            backends: self.registry.views(),
            recommendations: self.preferred_backends(),
            usage: self.feedback.usage(),
            feedback_records,
            started_at: self.started_at,
            uptime_seconds: (now - self.started_at).num_seconds(),
        }
    }
}

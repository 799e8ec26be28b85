//! Recommendation Cache.
//!
//! Answers "which backend should try first for this style?" from the
//! feedback aggregates, caching the answer per style for a short TTL. An
//! entry is also stale as soon as the feedback store's revision for its
//! style moves past the revision it was computed at, so new feedback is
//! reflected on the next read without a push from the store.

use crate::config::RecommendationConfig;
use crate::feedback::insights::compare_performance;
use crate::feedback::{FeedbackStore, PerformanceAggregate};
use crate::registry::Registry;
use crate::style::ConversationStyle;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Where a recommendation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Highest-scoring eligible aggregate
    Feedback,
    /// No eligible feedback; registry priority order
    DefaultOrder,
}

/// Cached recommendation for one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub backend: String,
    /// Aggregate score, or `None` for a cold-start default
    pub score: Option<f64>,
    pub source: RecommendationSource,
    pub expires_at: DateTime<Utc>,
    /// Feedback revision for the style when this entry was computed
    pub revision: u64,
}

/// Per-style recommendation cache with TTL.
///
/// Concurrent readers may both recompute an expired entry; both derive the
/// same answer from the same aggregates, so the last write winning is fine.
pub struct RecommendationCache {
    entries: DashMap<ConversationStyle, RecommendationEntry>,
    feedback: Arc<FeedbackStore>,
    registry: Arc<Registry>,
    config: RecommendationConfig,
}

impl RecommendationCache {
    pub fn new(
        feedback: Arc<FeedbackStore>,
        registry: Arc<Registry>,
        config: RecommendationConfig,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            feedback,
            registry,
            config,
        }
    }

    /// Preferred backend for `style`, or `None` when no backend is registered.
    pub fn get_preferred_backend(&self, style: ConversationStyle) -> Option<String> {
        self.get_preferred_backend_at(style, Utc::now())
    }

    /// [`get_preferred_backend`](Self::get_preferred_backend) evaluated at
    /// an explicit instant.
    pub fn get_preferred_backend_at(
        &self,
        style: ConversationStyle,
        now: DateTime<Utc>,
    ) -> Option<String> {
        self.entry_at(style, now).map(|entry| entry.backend)
    }

    /// The full cached entry, recomputing it if expired or stale.
    pub fn entry_at(
        &self,
        style: ConversationStyle,
        now: DateTime<Utc>,
    ) -> Option<RecommendationEntry> {
        let revision = self.feedback.revision(style);

        if let Some(entry) = self.entries.get(&style) {
            if entry.expires_at > now && entry.revision == revision {
                return Some(entry.clone());
            }
        }

        let fresh = self.compute(style, revision, now)?;
        tracing::debug!(
            style = %style,
            backend = %fresh.backend,
            score = ?fresh.score,
            source = ?fresh.source,
            "recomputed backend recommendation"
        );
        self.entries.insert(style, fresh.clone());
        Some(fresh)
    }

    /// Drop the cached entry for `style`; the next read recomputes.
    pub fn invalidate(&self, style: ConversationStyle) {
        self.entries.remove(&style);
    }

    /// Current cached entries, without recomputation.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<(ConversationStyle, RecommendationEntry)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        entries.sort_by_key(|(style, _)| *style);
        entries
    }

    fn compute(
        &self,
        style: ConversationStyle,
        revision: u64,
        now: DateTime<Utc>,
    ) -> Option<RecommendationEntry> {
        let order = self.registry.priority_order_names();
        let rank = |name: &str| order.iter().position(|n| n == name);

        let mut eligible: Vec<(usize, PerformanceAggregate)> = self
            .feedback
            .aggregates_for_style(style)
            .into_iter()
            .filter(|agg| agg.total_count >= self.config.min_feedback)
            .filter_map(|agg| rank(&agg.backend).map(|r| (r, agg)))
            .collect();

        eligible.sort_by(|(rank_a, a), (rank_b, b)| {
            match compare_performance(a, b) {
                Ordering::Equal => rank_a.cmp(rank_b),
                other => other,
            }
        });

        let expires_at = now
            + chrono::Duration::from_std(self.config.ttl())
                .unwrap_or_else(|_| chrono::Duration::seconds(300));

        match eligible.into_iter().next() {
            Some((_, best)) => Some(RecommendationEntry {
                backend: best.backend,
                score: Some(best.score),
                source: RecommendationSource::Feedback,
                expires_at,
                revision,
            }),
            None => order.into_iter().next().map(|backend| RecommendationEntry {
                backend,
                score: None,
                source: RecommendationSource::DefaultOrder,
                expires_at,
                revision,
            }),
        }
    }
}

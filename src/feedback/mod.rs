//! Feedback Store.
//!
//! Appends user feedback records and keeps one [`PerformanceAggregate`] per
//! (backend, style) pair up to date. Aggregates are mirrored in memory for
//! O(1) reads on the chat path and persisted through a [`FeedbackStorage`].
//! Every accepted record bumps a per-style revision counter, which is how the
//! recommendation cache learns that its entry for that style is stale.

mod aggregate;
mod error;
pub mod insights;
pub mod sqlite;
pub mod storage;
mod types;

pub use aggregate::{compute_score, PerformanceAggregate};
pub use error::FeedbackError;
pub use insights::{
    Analytics, Insights, PairSummary, Recommendation, RecommendationCategory,
    RecommendationPriority,
};
pub use sqlite::SqliteStorage;
pub use storage::{DailyCount, FeedbackStorage, MemoryStorage};
pub use types::{FeedbackKind, FeedbackRecord, THUMBS_DOWN_RATING, THUMBS_UP_RATING};

use crate::config::FeedbackConfig;
use crate::style::ConversationStyle;
use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type PairKey = (String, ConversationStyle);

/// Routing outcome counters for one (backend, style) pair.
///
/// Kept in memory only and never fed into the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub served: u64,
    pub failed: u64,
    pub mean_latency_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageView {
    pub backend: String,
    pub style: ConversationStyle,
    #[serde(flatten)]
    pub stats: UsageStats,
}

/// Thread-safe feedback store, shared by the API handlers and the facade.
pub struct FeedbackStore {
    storage: Arc<dyn FeedbackStorage>,
    aggregates: DashMap<PairKey, PerformanceAggregate>,
    revisions: DashMap<ConversationStyle, u64>,
    usage: DashMap<PairKey, UsageStats>,
    config: FeedbackConfig,
}

impl FeedbackStore {
    /// Create a store over `storage`, loading any persisted aggregates.
    pub fn new(
        storage: Arc<dyn FeedbackStorage>,
        config: FeedbackConfig,
    ) -> Result<Self, FeedbackError> {
        let aggregates = DashMap::new();
        for agg in storage.load_aggregates()? {
            aggregates.insert((agg.backend.clone(), agg.style), agg);
        }
        tracing::debug!(pairs = aggregates.len(), "loaded performance aggregates");

        Ok(Self {
            storage,
            aggregates,
            revisions: DashMap::new(),
            usage: DashMap::new(),
            config,
        })
    }

    /// Open the configured database, or fall back to in-memory storage.
    pub fn from_config(config: FeedbackConfig) -> Result<Self, FeedbackError> {
        let storage: Arc<dyn FeedbackStorage> = match &config.database_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "using sqlite feedback storage");
                Arc::new(SqliteStorage::open(path)?)
            }
            None => {
                tracing::info!("no feedback database configured, feedback will not persist");
                Arc::new(MemoryStorage::new())
            }
        };
        Self::new(storage, config)
    }

    pub fn in_memory(config: FeedbackConfig) -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            aggregates: DashMap::new(),
            revisions: DashMap::new(),
            usage: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Append a record and fold it into its aggregate.
    ///
    /// The read-modify-write runs under the pair's map entry lock, so
    /// concurrent submissions for the same pair never lose an update. The
    /// record and its updated aggregate are persisted in one storage write,
    /// and the in-memory aggregate only changes after that write succeeds.
    ///
    /// # Errors
    ///
    /// Validation errors for bad ratings/latencies or blank identifiers;
    /// storage errors when the record cannot be persisted.
    pub fn record_feedback(
        &self,
        record: FeedbackRecord,
    ) -> Result<PerformanceAggregate, FeedbackError> {
        record.validate()?;

        let key = (record.backend.clone(), record.style);
        let updated = match self.aggregates.entry(key) {
            Entry::Occupied(mut entry) => {
                let mut next = entry.get().clone();
                next.apply(&record);
                self.persist(&record, &next)?;
                entry.insert(next.clone());
                next
            }
            Entry::Vacant(entry) => {
                let mut next = PerformanceAggregate::empty(&record.backend, record.style);
                next.apply(&record);
                self.persist(&record, &next)?;
                entry.insert(next.clone());
                next
            }
        };

        *self.revisions.entry(record.style).or_insert(0) += 1;

        metrics::counter!(
            "chatroute_feedback_total",
            "backend" => record.backend.clone(),
            "style" => record.style.as_str(),
            "kind" => record.kind.as_str()
        )
        .increment(1);
        metrics::gauge!(
            "chatroute_performance_score",
            "backend" => record.backend.clone(),
            "style" => record.style.as_str()
        )
        .set(updated.score);

        tracing::info!(
            backend = %record.backend,
            style = %record.style,
            kind = record.kind.as_str(),
            score = updated.score,
            feedback_count = updated.total_count,
            "feedback recorded"
        );

        Ok(updated)
    }

    fn persist(
        &self,
        record: &FeedbackRecord,
        agg: &PerformanceAggregate,
    ) -> Result<(), FeedbackError> {
        self.storage.record(record, agg).map_err(|e| {
            tracing::error!(
                backend = %agg.backend,
                style = %agg.style,
                message_id = %record.message_id,
                error = %e,
                "failed to persist feedback"
            );
            e
        })
    }

    /// Record how a routed chat turn went. Does not touch the score.
    pub fn record_outcome(
        &self,
        backend: &str,
        style: ConversationStyle,
        latency_seconds: Option<f64>,
        success: bool,
    ) {
        let mut stats = self.usage.entry((backend.to_string(), style)).or_default();
        if success {
            let n = stats.served as f64;
            if let Some(latency) = latency_seconds.filter(|l| l.is_finite() && *l >= 0.0) {
                stats.mean_latency_seconds = (stats.mean_latency_seconds * n + latency) / (n + 1.0);
            }
            stats.served += 1;
        } else {
            stats.failed += 1;
        }
    }

    pub fn usage(&self) -> Vec<UsageView> {
        let mut views: Vec<UsageView> = self
            .usage
            .iter()
            .map(|entry| UsageView {
                backend: entry.key().0.clone(),
                style: entry.key().1,
                stats: entry.value().clone(),
            })
            .collect();
        views.sort_by(|a, b| a.backend.cmp(&b.backend).then(a.style.cmp(&b.style)));
        views
    }

    /// Monotonic counter of accepted feedback for `style`.
    pub fn revision(&self, style: ConversationStyle) -> u64 {
        self.revisions.get(&style).map(|r| *r).unwrap_or(0)
    }

    pub fn get_aggregate(&self, backend: &str, style: ConversationStyle) -> Option<PerformanceAggregate> {
        self.aggregates
            .get(&(backend.to_string(), style))
            .map(|entry| entry.value().clone())
    }

    pub fn aggregates_for_style(&self, style: ConversationStyle) -> Vec<PerformanceAggregate> {
        self.aggregates
            .iter()
            .filter(|entry| entry.key().1 == style)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn all_aggregates(&self) -> Vec<PerformanceAggregate> {
        self.aggregates
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn trends(&self) -> Result<Vec<DailyCount>, FeedbackError> {
        let since = Utc::now() - Duration::days(self.config.trend_days as i64);
        self.storage.daily_counts(since)
    }

    /// Underperformers, top performers, thin data, and recent volume.
    pub fn generate_insights(&self) -> Result<Insights, FeedbackError> {
        Ok(insights::build_insights(
            &self.all_aggregates(),
            self.trends()?,
            &self.config,
        ))
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        insights::build_recommendations(&self.all_aggregates(), &self.config)
    }

    pub fn analytics(&self) -> Result<Analytics, FeedbackError> {
        Ok(insights::build_analytics(&self.all_aggregates(), self.trends()?))
    }

    pub fn record_count(&self) -> Result<u64, FeedbackError> {
        self.storage.record_count()
    }
}

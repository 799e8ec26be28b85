//! Per (backend, style) performance rollups and the score derived from them.

use super::FeedbackRecord;
use crate::style::ConversationStyle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score weights. Quality and speed dominate; volume only breaks near-ties.
pub const RATING_WEIGHT: f64 = 0.4;
pub const SPEED_WEIGHT: f64 = 0.3;
pub const SUCCESS_WEIGHT: f64 = 0.2;
pub const VOLUME_WEIGHT: f64 = 0.1;

/// Feedback count at which the volume term saturates.
pub const VOLUME_SATURATION: f64 = 100.0;

/// Incrementally maintained summary for one (backend, style) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAggregate {
    pub backend: String,
    pub style: ConversationStyle,
    /// Running mean over records that carry a rating
    pub avg_rating: f64,
    pub rated_count: u64,
    /// Running mean over records that carry a latency
    pub avg_latency_seconds: f64,
    pub latency_count: u64,
    pub total_count: u64,
    /// Records whose rated response was not an error
    pub success_count: u64,
    pub positive_count: u64,
    pub negative_count: u64,
    pub success_rate: f64,
    /// In [0, 1]; see [`compute_score`]
    pub score: f64,
    pub last_updated: DateTime<Utc>,
}

impl PerformanceAggregate {
    pub fn empty(backend: impl Into<String>, style: ConversationStyle) -> Self {
        Self {
            backend: backend.into(),
            style,
            avg_rating: 0.0,
            rated_count: 0,
            avg_latency_seconds: 0.0,
            latency_count: 0,
            total_count: 0,
            success_count: 0,
            positive_count: 0,
            negative_count: 0,
            success_rate: 0.0,
            score: 0.0,
            last_updated: Utc::now(),
        }
    }

    /// Fold one record into the aggregate. O(1); raw history is never read.
    pub fn apply(&mut self, record: &FeedbackRecord) {
        if let Some(rating) = record.kind.rating() {
            let n = self.rated_count as f64;
            self.avg_rating = (self.avg_rating * n + rating as f64) / (n + 1.0);
            self.rated_count += 1;
        }

        if let Some(latency) = record.latency_seconds {
            let n = self.latency_count as f64;
            self.avg_latency_seconds = (self.avg_latency_seconds * n + latency) / (n + 1.0);
            self.latency_count += 1;
        }

        self.total_count += 1;
        if !record.response_error {
            self.success_count += 1;
        }
        if record.kind.is_positive() {
            self.positive_count += 1;
        }
        if record.kind.is_negative() {
            self.negative_count += 1;
        }

        self.success_rate = self.success_count as f64 / self.total_count as f64;
        self.score = compute_score(self);
        self.last_updated = record.timestamp.max(self.last_updated);
    }

    /// Mean latency, or `None` when no record carried one.
    pub fn latency(&self) -> Option<f64> {
        (self.latency_count > 0).then_some(self.avg_latency_seconds)
    }
}

/// `0.4·(rating/5) + 0.3·min(1/latency, 1) + 0.2·success_rate + 0.1·min(n/100, 1)`
///
/// Each term is clamped to [0, 1] before weighting, so the score is bounded
/// for any input. The speed term is 0 without latency samples and 1 for a
/// zero average latency.
pub fn compute_score(agg: &PerformanceAggregate) -> f64 {
    let rating_term = if agg.rated_count > 0 {
        unit(agg.avg_rating / 5.0)
    } else {
        0.0
    };

    let speed_term = match agg.latency() {
        None => 0.0,
        Some(latency) if latency <= 0.0 => 1.0,
        Some(latency) => unit(1.0 / latency),
    };

    let success_term = unit(agg.success_rate);
    let volume_term = unit(agg.total_count as f64 / VOLUME_SATURATION);

    unit(
        RATING_WEIGHT * rating_term
            + SPEED_WEIGHT * speed_term
            + SUCCESS_WEIGHT * success_term
            + VOLUME_WEIGHT * volume_term,
    )
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

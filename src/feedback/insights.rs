//! Read-side reports over performance aggregates.
//!
//! Everything here is a pure function of an aggregate snapshot plus the
//! configured thresholds. Nothing is written back.

use super::storage::DailyCount;
use super::PerformanceAggregate;
use crate::config::FeedbackConfig;
use crate::style::ConversationStyle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Compact view of one (backend, style) pair in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub backend: String,
    pub style: ConversationStyle,
    pub score: f64,
    pub avg_rating: f64,
    pub feedback_count: u64,
}

impl From<&PerformanceAggregate> for PairSummary {
    fn from(agg: &PerformanceAggregate) -> Self {
        Self {
            backend: agg.backend.clone(),
            style: agg.style,
            score: agg.score,
            avg_rating: agg.avg_rating,
            feedback_count: agg.total_count,
        }
    }
}

/// Insight report over all aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// Score below the threshold with enough samples, worst first
    pub underperforming: Vec<PairSummary>,
    /// Highest-scoring backend for each style that has feedback
    pub top_performers: Vec<PairSummary>,
    /// Pairs with too little feedback to judge
    pub insufficient_data: Vec<PairSummary>,
    /// Daily feedback volume over the trend window
    pub trends: Vec<DailyCount>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    PerformanceIssue,
    Optimization,
}

/// An actionable item for an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub category: RecommendationCategory,
    pub backend: String,
    pub style: ConversationStyle,
    pub score: f64,
    pub description: String,
    pub action: String,
}

/// Totals across all feedback, plus every pair ordered by score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_feedback: u64,
    /// Mean over all rated feedback (thumbs count as 5 / 1)
    pub average_rating: f64,
    pub positive: u64,
    pub negative: u64,
    /// Positive share of all feedback, as a percentage
    pub satisfaction_rate: f64,
    pub performance: Vec<PairSummary>,
    pub recent_trends: Vec<DailyCount>,
}

/// Ordering used everywhere a "best" pair is chosen: score descending, then
/// lower mean latency (pairs without latency last).
pub fn compare_performance(a: &PerformanceAggregate, b: &PerformanceAggregate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| match (a.latency(), b.latency()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

pub fn build_insights(
    aggregates: &[PerformanceAggregate],
    trends: Vec<DailyCount>,
    config: &FeedbackConfig,
) -> Insights {
    let mut underperforming: Vec<&PerformanceAggregate> = aggregates
        .iter()
        .filter(|a| {
            a.score < config.underperforming_threshold && a.total_count >= config.min_sample_size
        })
        .collect();
    underperforming.sort_by(|a, b| compare_performance(b, a));

    let mut best: BTreeMap<ConversationStyle, &PerformanceAggregate> = BTreeMap::new();
    for agg in aggregates.iter().filter(|a| a.total_count > 0) {
        best.entry(agg.style)
            .and_modify(|current| {
                if compare_performance(agg, current) == Ordering::Less {
                    *current = agg;
                }
            })
            .or_insert(agg);
    }

    let mut insufficient_data: Vec<&PerformanceAggregate> = aggregates
        .iter()
        .filter(|a| a.total_count < config.insufficient_data_below)
        .collect();
    insufficient_data.sort_by(|a, b| {
        a.style
            .cmp(&b.style)
            .then_with(|| a.backend.cmp(&b.backend))
    });

    Insights {
        underperforming: underperforming.into_iter().map(PairSummary::from).collect(),
        top_performers: best.into_values().map(PairSummary::from).collect(),
        insufficient_data: insufficient_data.into_iter().map(PairSummary::from).collect(),
        trends,
        generated_at: Utc::now(),
    }
}

/// Derive operator recommendations: high priority for every underperforming
/// pair, medium for pairs scoring above the top-performer threshold with
/// enough feedback to trust.
pub fn build_recommendations(
    aggregates: &[PerformanceAggregate],
    config: &FeedbackConfig,
) -> Vec<Recommendation> {
    let mut sorted: Vec<&PerformanceAggregate> = aggregates.iter().collect();
    sorted.sort_by(|a, b| compare_performance(b, a));

    let mut recommendations: Vec<Recommendation> = sorted
        .iter()
        .filter(|a| {
            a.score < config.underperforming_threshold && a.total_count >= config.min_sample_size
        })
        .map(|a| Recommendation {
            priority: RecommendationPriority::High,
            category: RecommendationCategory::PerformanceIssue,
            backend: a.backend.clone(),
            style: a.style,
            score: a.score,
            description: format!(
                "Backend '{}' with style '{}' has low performance (score: {:.3})",
                a.backend, a.style, a.score
            ),
            action: format!(
                "Consider improving prompts or replacing the backend for {} conversations",
                a.style
            ),
        })
        .collect();

    recommendations.extend(
        sorted
            .iter()
            .rev()
            .filter(|a| {
                a.score > config.top_performer_threshold
                    && a.total_count >= config.top_performer_min_count
            })
            .map(|a| Recommendation {
                priority: RecommendationPriority::Medium,
                category: RecommendationCategory::Optimization,
                backend: a.backend.clone(),
                style: a.style,
                score: a.score,
                description: format!(
                    "Backend '{}' with style '{}' is performing excellently (score: {:.3})",
                    a.backend, a.style, a.score
                ),
                action: format!(
                    "Consider using {} as default for {} conversations",
                    a.backend, a.style
                ),
            }),
    );

    recommendations
}

pub fn build_analytics(aggregates: &[PerformanceAggregate], trends: Vec<DailyCount>) -> Analytics {
    let total_feedback: u64 = aggregates.iter().map(|a| a.total_count).sum();
    let rated: u64 = aggregates.iter().map(|a| a.rated_count).sum();
    let rating_sum: f64 = aggregates
        .iter()
        .map(|a| a.avg_rating * a.rated_count as f64)
        .sum();
    let positive: u64 = aggregates.iter().map(|a| a.positive_count).sum();
    let negative: u64 = aggregates.iter().map(|a| a.negative_count).sum();

    let mut sorted: Vec<&PerformanceAggregate> = aggregates.iter().collect();
    sorted.sort_by(|a, b| compare_performance(a, b));

    Analytics {
        total_feedback,
        average_rating: if rated > 0 {
            round_to(rating_sum / rated as f64, 2)
        } else {
            0.0
        },
        positive,
        negative,
        satisfaction_rate: round_to(positive as f64 / total_feedback.max(1) as f64 * 100.0, 1),
        performance: sorted.into_iter().map(PairSummary::from).collect(),
        recent_trends: trends,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

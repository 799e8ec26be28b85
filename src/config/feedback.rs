//! Feedback store configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for feedback persistence and insight thresholds.
///
/// # Example
///
/// ```toml
/// [feedback]
/// database_path = "chatroute-feedback.db"
/// underperforming_threshold = 0.5
/// min_sample_size = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// SQLite file for records and aggregates.
    ///
    /// Absent: feedback is kept in memory and lost on restart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Score below which a (backend, style) pair is reported as underperforming.
    ///
    /// Default: 0.5
    pub underperforming_threshold: f64,

    /// Minimum feedback count before a pair can be flagged as underperforming.
    ///
    /// Default: 5
    pub min_sample_size: u64,

    /// Pairs with fewer records than this are reported as having insufficient data.
    ///
    /// Default: 3
    pub insufficient_data_below: u64,

    /// Score above which a pair is recommended as a default.
    ///
    /// Default: 0.8
    pub top_performer_threshold: f64,

    /// Minimum feedback count for a top-performer recommendation.
    ///
    /// Default: 10
    pub top_performer_min_count: u64,

    /// Window for daily feedback trend reporting.
    ///
    /// Default: 7 days
    pub trend_days: u32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            underperforming_threshold: 0.5,
            min_sample_size: 5,
            insufficient_data_below: 3,
            top_performer_threshold: 0.8,
            top_performer_min_count: 10,
            trend_days: 7,
        }
    }
}

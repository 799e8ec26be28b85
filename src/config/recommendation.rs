//! Recommendation cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a per-style backend recommendation stays valid, and how much
/// feedback an aggregate needs before it can be recommended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Default: 300 seconds
    pub ttl_seconds: u64,
    /// Default: 1
    pub min_feedback: u64,
}

impl RecommendationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            min_feedback: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_config_defaults() {
        let config = RecommendationConfig::default();
        assert_eq!(config.ttl(), Duration::from_secs(300));
        assert_eq!(config.min_feedback, 1);
    }
}

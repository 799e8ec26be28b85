//! # Metrics
//!
//! Prometheus export for routing and feedback activity.
//!
//! **Counters:**
//! - `chatroute_requests_total{backend, style, status}` - Backend invocations
//! - `chatroute_fallbacks_total{from, to}` - Turns served by a later candidate
//! - `chatroute_backend_failures_total{backend, kind}` - Skips and failures by kind
//! - `chatroute_exhausted_total{style}` - Turns no backend could serve
//! - `chatroute_feedback_total{backend, style, kind}` - Accepted feedback
//!
//! **Histograms:**
//! - `chatroute_request_duration_seconds{backend}` - Backend reply latency
//!
//! **Gauges:**
//! - `chatroute_performance_score{backend, style}` - Latest aggregate score
//! - `chatroute_backends_total` / `chatroute_backends_available`

use crate::registry::Registry;
use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Renders Prometheus text and keeps registry gauges current.
pub struct MetricsCollector {
    registry: Arc<Registry>,
    label_cache: DashMap<String, String>,
    prometheus_handle: PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(registry: Arc<Registry>, prometheus_handle: PrometheusHandle) -> Self {
        Self {
            registry,
            label_cache: DashMap::new(),
            prometheus_handle,
        }
    }

    /// Prometheus-safe form of a name: `[a-zA-Z_][a-zA-Z0-9_]*` (cached).
    pub fn sanitize_label(&self, label: &str) -> String {
        if let Some(cached) = self.label_cache.get(label) {
            return cached.clone();
        }

        let mut sanitized: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            sanitized.insert(0, '_');
        }

        self.label_cache.insert(label.to_string(), sanitized.clone());
        sanitized
    }

    pub fn update_backend_gauges(&self) {
        let backends = self.registry.priority_order();
        metrics::gauge!("chatroute_backends_total").set(backends.len() as f64);
        let available = backends.iter().filter(|b| b.is_available()).count();
        metrics::gauge!("chatroute_backends_available").set(available as f64);
    }

    pub fn render_metrics(&self) -> String {
        self.update_backend_gauges();
        self.prometheus_handle.render()
    }
}

/// Install the global Prometheus recorder with latency buckets tuned for
/// chat backends (seconds).
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let duration_buckets = &[0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 15.0, 30.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("chatroute_request_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Recorder handle that is not installed globally; for tests and for a
/// server started when a recorder is already installed.
pub fn detached_handle() -> PrometheusHandle {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle()
}

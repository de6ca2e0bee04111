//! Metrics instrumentation for the request pipeline.

use std::time::Instant;

/// Record end-to-end request latency.
pub fn record_request_latency(duration_ms: f64) {
    metrics::histogram!("pipeline_request_latency", duration_ms);
}

/// Record one gateway round-trip latency.
pub fn record_gateway_latency(duration_ms: f64) {
    metrics::histogram!("gateway_request_latency", duration_ms);
}

pub fn increment_cache_hit() {
    metrics::counter!("pipeline_cache_hits", 1);
}

pub fn increment_cache_miss() {
    metrics::counter!("pipeline_cache_misses", 1);
}

pub fn increment_fallback_plan() {
    metrics::counter!("pipeline_fallback_plans", 1);
}

pub fn increment_gateway_error() {
    metrics::counter!("pipeline_gateway_errors", 1);
}

pub fn increment_validation_rejected() {
    metrics::counter!("pipeline_validation_rejections", 1);
}

/// RAII timer for automatic latency recording.
pub struct MetricTimer {
    start: Instant,
    metric_name: &'static str,
}

impl MetricTimer {
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }
}

impl Drop for MetricTimer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        match self.metric_name {
            "pipeline_request_latency" => record_request_latency(duration_ms),
            "gateway_request_latency" => record_gateway_latency(duration_ms),
            _ => {}
        }
    }
}

//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Wishbox metrics
pub const METRICS_PREFIX: &str = "wishbox";

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Submission metrics
    describe_counter!(
        format!("{}_submissions_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total wish list submissions created"
    );

    describe_counter!(
        format!("{}_submission_updates_total", METRICS_PREFIX),
        Unit::Count,
        "Total wish list submission status updates"
    );

    // Notification metrics
    describe_counter!(
        format!("{}_notification_emails_total", METRICS_PREFIX),
        Unit::Count,
        "Total approval notification emails dispatched"
    );

    describe_counter!(
        format!("{}_notification_sms_total", METRICS_PREFIX),
        Unit::Count,
        "Total approval notification SMS messages dispatched"
    );

    describe_counter!(
        format!("{}_notification_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total notification transport errors"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record submission lifecycle metrics
pub fn record_submission(event: &str) {
    match event {
        "created" => {
            counter!(format!("{}_submissions_created_total", METRICS_PREFIX)).increment(1);
        }
        _ => {
            counter!(
                format!("{}_submission_updates_total", METRICS_PREFIX),
                "event" => event.to_string()
            )
            .increment(1);
        }
    }
}

/// Helper to record notification dispatch metrics
pub fn record_notification(channel: &str, recipients: usize, success: bool) {
    let name = match channel {
        "email" => format!("{}_notification_emails_total", METRICS_PREFIX),
        _ => format!("{}_notification_sms_total", METRICS_PREFIX),
    };

    if success {
        counter!(name).increment(recipients as u64);
    } else {
        counter!(
            format!("{}_notification_errors_total", METRICS_PREFIX),
            "channel" => channel.to_string()
        )
        .increment(1);
    }
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/api/submissions");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without panic
    }

    #[test]
    fn test_record_helpers() {
        record_submission("created");
        record_submission("status_changed");
        record_notification("email", 4, true);
        record_notification("sms", 0, false);
        record_cache(true, "reference");
        record_cache(false, "reference");
    }
}

//! Prometheus metrics for gateway observability.
//!
//! Metrics are exposed by a dedicated HTTP listener (default port 9090,
//! `METRICS_PORT=0` disables it).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `stagegate_tokens_issued_total` - bearer tokens issued
//! - `stagegate_rate_limit_rejections_total` - 429s served (label: route)
//! - `stagegate_upstream_failures_total` - upstream failures (label: kind,
//!   one of `unreachable`, `bad_status`, `malformed`)
//!
//! ## Histograms
//! - `stagegate_upstream_request_duration_seconds` - provider round-trip time
//!
//! All recording functions are no-ops when no exporter is installed, so
//! tests and metrics-disabled deployments need no special handling.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const TOKENS_ISSUED_TOTAL: &str = "stagegate_tokens_issued_total";
    pub const RATE_LIMIT_REJECTIONS_TOTAL: &str = "stagegate_rate_limit_rejections_total";
    pub const UPSTREAM_FAILURES_TOTAL: &str = "stagegate_upstream_failures_total";
    pub const UPSTREAM_REQUEST_DURATION_SECONDS: &str =
        "stagegate_upstream_request_duration_seconds";
}

/// Initialize the Prometheus metrics exporter.
///
/// Sets up metric descriptions and starts the Prometheus HTTP listener on
/// the given address.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::TOKENS_ISSUED_TOTAL,
        "Total number of bearer tokens issued"
    );
    describe_counter!(
        names::RATE_LIMIT_REJECTIONS_TOTAL,
        "Total number of requests rejected by the rate limiter"
    );
    describe_counter!(
        names::UPSTREAM_FAILURES_TOTAL,
        "Total number of failed listings provider calls"
    );
    describe_histogram!(
        names::UPSTREAM_REQUEST_DURATION_SECONDS,
        "Listings provider request duration in seconds"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
///
/// Metrics are optional; the gateway serves traffic without them.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record an issued bearer token.
pub fn record_token_issued() {
    counter!(names::TOKENS_ISSUED_TOTAL).increment(1);
}

/// Record a 429 served for a throttled route.
pub fn record_rate_limit_rejection(route: &str) {
    counter!(names::RATE_LIMIT_REJECTIONS_TOTAL, "route" => route.to_string()).increment(1);
}

/// Record an upstream failure; `kind` is one of `unreachable`,
/// `bad_status`, `malformed`.
pub fn record_upstream_failure(kind: &'static str) {
    counter!(names::UPSTREAM_FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Record a completed upstream round trip.
pub fn record_upstream_duration(duration_secs: f64) {
    histogram!(names::UPSTREAM_REQUEST_DURATION_SECONDS).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These verify the recording functions don't panic without an
    // installed exporter.

    #[test]
    fn test_record_token_issued() {
        record_token_issued();
    }

    #[test]
    fn test_record_rate_limit_rejection() {
        record_rate_limit_rejection("/token");
    }

    #[test]
    fn test_record_upstream_failure() {
        record_upstream_failure("unreachable");
        record_upstream_failure("bad_status");
        record_upstream_failure("malformed");
    }

    #[test]
    fn test_record_upstream_duration() {
        record_upstream_duration(0.25);
    }
}

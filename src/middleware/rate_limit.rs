//! Sliding-window rate limiting middleware.
//!
//! # Algorithm
//!
//! A strict sliding window: the limiter keeps the timestamps of admitted
//! requests per `(route, client)` key, prunes entries that fell out of the
//! trailing window, and rejects once the resident count reaches the route's
//! budget. Pruning is relative to `now`, not to bucket boundaries, so a
//! burst of `max_requests` at the end of one minute and another burst at
//! the start of the next is correctly throttled (the usual fixed-bucket
//! failure mode).
//!
//! # Configuration
//!
//! A route path maps to `(max_requests, window)`; routes absent from the
//! table pass through unthrottled. A rejected attempt is **not** recorded,
//! so hammering a 429 does not extend the lockout.
//!
//! # Response Headers
//!
//! On rate limit exceeded (429):
//! - `Retry-After`: seconds until the oldest resident timestamp ages out
//! - `X-RateLimit-Limit`: configured budget for the route
//! - `X-RateLimit-Remaining`: always `0` on rejection
//!
//! # Concurrency
//!
//! Window state lives in a `DashMap`; the entry guard holds the shard lock
//! for the whole prune-check-append sequence, so two concurrent requests
//! for one key can never both observe `count = max - 1` and both be
//! admitted.
//!
//! Keys are never evicted: a long-running process accumulates one entry per
//! client address it has ever seen on a throttled route. Accepted for the
//! current scope; a periodic sweep or LRU cap would bound it.

use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use dashmap::DashMap;
use tower::{Layer, Service};
use tracing::warn;

use super::ip::extract_client_ip;
use crate::metrics;

/// Per-route budget: at most `max_requests` within any trailing `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteBudget {
    pub max_requests: usize,
    pub window: Duration,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    Rejected {
        /// Time until the oldest resident timestamp ages out of the window.
        retry_after: Duration,
    },
}

/// Strict sliding-window rate limiter over `(route, client)` keys.
///
/// Constructed once at startup and injected into the request pipeline;
/// there is no ambient global state. The guarantee is per-process only -
/// no cross-process coordination.
pub struct SlidingWindowLimiter {
    budgets: HashMap<String, RouteBudget>,
    windows: DashMap<(String, String), Vec<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter from a route → budget table.
    pub fn new(budgets: HashMap<String, RouteBudget>) -> Self {
        Self {
            budgets,
            windows: DashMap::new(),
        }
    }

    /// The configured budget for a route, if it is throttled at all.
    pub fn budget(&self, route: &str) -> Option<RouteBudget> {
        self.budgets.get(route).copied()
    }

    /// Check and record a request for `(route, client)` at time `now`.
    ///
    /// Timestamps strictly older than `now - window` are pruned; one at
    /// exactly `now - window` is still resident. If the pruned count has
    /// reached the budget the request is rejected and **not** recorded,
    /// otherwise `now` is appended and the request is admitted. Routes
    /// without a budget are always admitted.
    pub fn admit(&self, route: &str, client: &str, now: Instant) -> Decision {
        let Some(budget) = self.budgets.get(route) else {
            return Decision::Admitted;
        };

        let mut entry = self
            .windows
            .entry((route.to_string(), client.to_string()))
            .or_default();

        // Holding the entry guard makes prune-check-append atomic per key.
        if let Some(cutoff) = now.checked_sub(budget.window) {
            entry.retain(|&t| t >= cutoff);
        }

        if entry.len() >= budget.max_requests {
            let retry_after = entry
                .first()
                .map(|&oldest| (oldest + budget.window).saturating_duration_since(now))
                .unwrap_or_default();
            return Decision::Rejected { retry_after };
        }

        entry.push(now);
        Decision::Admitted
    }

    /// Number of resident timestamps for a key (after its last pruning).
    #[cfg(test)]
    fn resident(&self, route: &str, client: &str) -> usize {
        self.windows
            .get(&(route.to_string(), client.to_string()))
            .map(|e| e.len())
            .unwrap_or(0)
    }
}

/// Rate limiting layer for the Tower middleware stack.
///
/// Applied to the whole router; only routes present in the limiter's budget
/// table are throttled, so `/health` and friends pass through untouched.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<SlidingWindowLimiter>,
}

impl RateLimitLayer {
    pub fn new(limiter: Arc<SlidingWindowLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Rate limiting service wrapper.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<SlidingWindowLimiter>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        let path = req.uri().path().to_string();
        let client_ip = extract_client_ip(&req).into_owned();

        Box::pin(async move {
            let Some(budget) = limiter.budget(&path) else {
                // Unthrottled route.
                return inner.call(req).await;
            };

            match limiter.admit(&path, &client_ip, Instant::now()) {
                Decision::Admitted => inner.call(req).await,
                Decision::Rejected { retry_after } => {
                    let retry_after_secs = retry_after.as_secs().max(1);

                    warn!(
                        client_ip = %client_ip,
                        path = %path,
                        retry_after_secs,
                        "Rate limit exceeded"
                    );
                    metrics::record_rate_limit_rejection(&path);

                    let response = (
                        StatusCode::TOO_MANY_REQUESTS,
                        [
                            ("Retry-After", retry_after_secs.to_string()),
                            ("X-RateLimit-Limit", budget.max_requests.to_string()),
                            ("X-RateLimit-Remaining", "0".to_string()),
                            ("Content-Type", "application/json".to_string()),
                        ],
                        r#"{"error":"too_many_requests","message":"Rate limit exceeded. Please retry later."}"#,
                    )
                        .into_response();

                    Ok(response)
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn limiter(max_requests: usize, window_secs: u64) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(HashMap::from([(
            "/listings".to_string(),
            RouteBudget {
                max_requests,
                window: Duration::from_secs(window_secs),
            },
        )]))
    }

    fn admitted(d: Decision) -> bool {
        matches!(d, Decision::Admitted)
    }

    #[test]
    fn test_burst_within_budget_admitted_then_rejected() {
        let limiter = limiter(3, 60);
        let base = Instant::now();
        let t = |s: u64| base + Duration::from_secs(s);

        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(0))));
        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(1))));
        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(2))));
        assert!(!admitted(limiter.admit("/listings", "1.2.3.4", t(3))));
    }

    #[test]
    fn test_admitted_again_after_oldest_ages_out() {
        let limiter = limiter(3, 60);
        let base = Instant::now();
        let t = |s: u64| base + Duration::from_secs(s);

        for s in [0, 1, 2] {
            assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(s))));
        }
        assert!(!admitted(limiter.admit("/listings", "1.2.3.4", t(3))));

        // At t=61 the t=0 timestamp has aged out (t=1 sits exactly on the
        // window edge and is still resident), freeing one slot.
        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(61))));
        assert_eq!(limiter.resident("/listings", "1.2.3.4"), 3);
    }

    #[test]
    fn test_rejected_attempt_is_not_recorded() {
        let limiter = limiter(2, 60);
        let base = Instant::now();
        let t = |s: u64| base + Duration::from_secs(s);

        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(0))));
        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(1))));
        for s in 2..10 {
            assert!(!admitted(limiter.admit("/listings", "1.2.3.4", t(s))));
        }
        // Only the two admitted requests are resident.
        assert_eq!(limiter.resident("/listings", "1.2.3.4"), 2);
    }

    #[test]
    fn test_clients_have_independent_budgets() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(admitted(limiter.admit("/listings", "1.2.3.4", now)));
        assert!(!admitted(limiter.admit("/listings", "1.2.3.4", now)));
        // A different client is unaffected by the first one's exhaustion.
        assert!(admitted(limiter.admit("/listings", "5.6.7.8", now)));
    }

    #[test]
    fn test_unconfigured_route_is_unthrottled() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        for _ in 0..100 {
            assert!(admitted(limiter.admit("/health", "1.2.3.4", now)));
        }
        // Unthrottled routes record nothing.
        assert_eq!(limiter.resident("/health", "1.2.3.4"), 0);
    }

    #[test]
    fn test_rejection_reports_time_until_oldest_expires() {
        let limiter = limiter(1, 60);
        let base = Instant::now();
        let t = |s: u64| base + Duration::from_secs(s);

        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(0))));
        match limiter.admit("/listings", "1.2.3.4", t(10)) {
            Decision::Rejected { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(50));
            }
            Decision::Admitted => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_timestamp_on_window_edge_is_still_resident() {
        let limiter = limiter(1, 60);
        let base = Instant::now();
        let t = |s: u64| base + Duration::from_secs(s);

        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(0))));
        // Exactly window seconds later the original timestamp still counts.
        assert!(!admitted(limiter.admit("/listings", "1.2.3.4", t(60))));
        // One second past the edge it has aged out.
        assert!(admitted(limiter.admit("/listings", "1.2.3.4", t(61))));
    }
}

//! Shared application state for Axum handlers.
//!
//! The state is cloned per request; everything expensive (the JWT keys,
//! the upstream connection pool, the rate limiter's window table) lives
//! behind an `Arc` inside its service and is shared across clones.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::AppResult;
use crate::middleware::SlidingWindowLimiter;
use crate::token::TokenService;
use crate::upstream::ListingsClient;

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Issues and verifies bearer tokens
    pub tokens: TokenService,
    /// Client for the upstream listings provider
    pub listings: ListingsClient,
    /// Per-route, per-client sliding-window rate limiter
    pub limiter: Arc<SlidingWindowLimiter>,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the application state from validated configuration.
    ///
    /// Fails if the JWT algorithm is not an HMAC variant or the HTTP
    /// client cannot be constructed.
    pub fn new(config: Config) -> AppResult<Self> {
        let tokens = TokenService::new(
            &config.jwt_secret,
            &config.jwt_algorithm,
            config.token_ttl(),
        )?;
        let listings = ListingsClient::new(
            &config.provider_base_url,
            &config.provider_api_key,
            config.provider_timeout,
        )?;
        let limiter = Arc::new(SlidingWindowLimiter::new(config.rate_budgets()));

        Ok(Self {
            tokens,
            listings,
            limiter,
            started_at: Instant::now(),
            config: Arc::new(config),
        })
    }

    /// Seconds since the application started.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

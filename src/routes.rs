//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (applied in order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Adds X-Request-Id header
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Rate Limiting   │ ← 429 if the route's window is full
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Bearer Auth    │ ← 401 if invalid (only on /listings)
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! The ordering is load-bearing: the rate limiter sits outside auth so a
//! flood of bad tokens is throttled before any signature is checked, and
//! `/health` carries neither layer so probes always get through.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{LISTINGS_ROUTE, TOKEN_ROUTE};
use crate::handlers;
use crate::middleware::{BearerAuth, RateLimitLayer};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let cors = build_cors_layer(&config.cors_allowed_origins);

    info!(
        token_budget = config.token_rate.max_requests,
        listings_budget = config.listings_rate.max_requests,
        "Rate limiting configured"
    );

    // Bearer auth applies only to the listings route.
    let protected = Router::new()
        .route(LISTINGS_ROUTE, get(handlers::get_listings))
        .route_layer(BearerAuth::new(state.tokens.clone()));

    Router::new()
        .route(TOKEN_ROUTE, post(handlers::issue_token))
        .route("/health", get(handlers::health_check))
        .merge(protected)
        // Applied bottom to top: the last layer added runs first.
        .layer(RateLimitLayer::new(state.limiter.clone()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Build CORS layer from configuration.
///
/// `*` allows any origin; convenient for development, avoid in production.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

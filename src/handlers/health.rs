//! Health endpoint.

use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// Always returns 200 OK. The endpoint is deliberately left outside both
/// the rate limiter and bearer auth so that load balancer probes keep
/// working while clients are being throttled.
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        message: format!(
            "{} v{} up {}s",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            state.uptime_seconds()
        ),
    })
}

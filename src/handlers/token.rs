//! Token issuance endpoint.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::metrics;
use crate::models::TokenResponse;
use crate::state::AppState;

/// Optional body for `POST /token`.
///
/// The body may be omitted entirely, in which case the token is issued
/// for the anonymous subject.
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    /// Subject to mint the token for.
    pub subject: Option<String>,
}

/// Issue a short-lived bearer token.
///
/// No credentials are required; possession of a token proves only that
/// the caller went through this endpoint recently, which is what the
/// rate limiter on it is for.
#[instrument(skip(state, body))]
pub async fn issue_token(
    State(state): State<AppState>,
    body: Option<Json<TokenRequest>>,
) -> AppResult<Json<TokenResponse>> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let token = state.tokens.issue(request.subject.as_deref())?;

    metrics::record_token_issued();
    debug!("issued bearer token");

    Ok(Json(TokenResponse {
        token,
        expires_in: state.tokens.expires_in_secs(),
    }))
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Error Families
///
/// - `AuthenticationFailed` - any token problem (missing, malformed, bad
///   signature, wrong audience/issuer, expired). Deliberately carries no
///   sub-reason so callers cannot probe which check failed.
/// - `RateLimitExceeded` - a per-route request budget is exhausted.
/// - `UpstreamUnreachable` / `UpstreamBadStatus` / `UpstreamMalformed` -
///   the three ways talking to the listings provider can fail. All map to
///   502, each with a distinguishing message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded {
        /// Seconds until the oldest resident timestamp ages out.
        retry_after_secs: u64,
    },

    #[error("listings provider is unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("listings provider returned status {0}")]
    UpstreamBadStatus(u16),

    #[error("failed to parse listings provider response: {0}")]
    UpstreamMalformed(String),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Full details go to the server log; clients get sanitized messages.
        tracing::error!(error = %self, "Request failed");

        let (status, error_type, message) = match &self {
            // One generic message for every auth failure, on purpose.
            AppError::AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing, invalid, or expired token.".to_string(),
            ),

            AppError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_requests",
                "Rate limit exceeded. Please retry later.".to_string(),
            ),

            // Upstream failures all surface as 502, but the message says
            // which of the three families occurred.
            AppError::UpstreamUnreachable(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream_unreachable",
                "The listings provider could not be reached.".to_string(),
            ),
            AppError::UpstreamBadStatus(code) => (
                StatusCode::BAD_GATEWAY,
                "upstream_bad_status",
                format!("The listings provider returned status {code}."),
            ),
            AppError::UpstreamMalformed(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream_malformed",
                "The listings provider returned a malformed response.".to_string(),
            ),

            // Client errors are safe to echo; they describe the caller's input.
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),

            AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Service configuration error.".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred.".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        // 429 responses carry backoff headers alongside the JSON body.
        if let AppError::RateLimitExceeded { retry_after_secs } = &self {
            return (
                status,
                [("Retry-After", retry_after_secs.to_string())],
                axum::Json(body),
            )
                .into_response();
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

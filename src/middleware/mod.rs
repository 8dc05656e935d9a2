//! HTTP middleware: rate limiting, bearer authentication, client identity.
//!
//! The pipeline composition is itself a contract (see `routes.rs`): CORS
//! runs outermost, then the sliding-window rate limiter, then bearer token
//! verification on the protected routes, then the handler. Rate limiting
//! before authentication means unauthenticated flooding is throttled too.

pub mod auth;
pub mod ip;
pub mod rate_limit;

pub use auth::{AuthSubject, BearerAuth};
pub use ip::{UNKNOWN_CLIENT, extract_client_ip};
pub use rate_limit::{Decision, RateLimitLayer, RouteBudget, SlidingWindowLimiter};

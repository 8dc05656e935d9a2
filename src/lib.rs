//! # StageGate
//!
//! A small edge gateway in front of a public performance-listings API,
//! featuring:
//!
//! - **Token issuance**: short-lived HMAC-signed bearer tokens
//! - **Rate limiting**: strict per-client, per-route sliding windows
//! - **Upstream proxy**: XML listings normalized to JSON with typed
//!   502 failure mapping
//! - **Observability**: request IDs, structured logging, Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (CORS → Request ID → Trace → Rate Limit → Auth) │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (token, health, listings)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Services (TokenService, ListingsClient)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Upstream listings provider (XML over HTTP)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stagegate::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config)?;
//!     let app = build_router(state);
//!
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod token;
pub mod upstream;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
pub use token::TokenService;
pub use upstream::ListingsClient;

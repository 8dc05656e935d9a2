//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible
//! defaults for development. In production, configure via environment
//! variables or a `.env` file.
//!
//! # Required Values
//!
//! - `PROVIDER_API_KEY`: key for the upstream listings provider
//! - `JWT_SECRET`: symmetric secret for signing bearer tokens
//!
//! Startup fails with a configuration error when either is missing.
//!
//! # Rate Budgets
//!
//! Each throttled route has its own `(max_requests, window_seconds)` pair:
//!
//! - `TOKEN_RATE_LIMIT` / `TOKEN_RATE_WINDOW_SECS` (default 10 / 60)
//! - `LISTINGS_RATE_LIMIT` / `LISTINGS_RATE_WINDOW_SECS` (default 50 / 60)

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::middleware::RouteBudget;

/// Route path for token issuance.
pub const TOKEN_ROUTE: &str = "/token";

/// Route path for the proxied listings endpoint.
pub const LISTINGS_ROUTE: &str = "/listings";

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 8000)
    pub port: u16,

    // =========================================================================
    // Upstream Provider Configuration
    // =========================================================================
    /// API key for the listings provider (required)
    pub provider_api_key: String,

    /// Base URL of the listings provider REST API
    pub provider_base_url: String,

    /// Timeout for a single upstream request (default: 15 seconds)
    pub provider_timeout: Duration,

    /// Genre code sent with every listings query (default: "CCCD",
    /// the provider's code for popular music)
    pub provider_category: String,

    // =========================================================================
    // Token Configuration
    // =========================================================================
    /// Symmetric secret for signing tokens (required)
    pub jwt_secret: String,

    /// Signing algorithm name (default: "HS256")
    pub jwt_algorithm: String,

    /// Credential lifetime in minutes (default: 10)
    pub token_ttl_minutes: u64,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Budget for `POST /token` (default: 10 requests / 60 seconds)
    pub token_rate: RouteBudget,

    /// Budget for `GET /listings` (default: 50 requests / 60 seconds)
    pub listings_rate: RouteBudget,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Comma-separated list of allowed CORS origins
    /// Use "*" to allow all origins (not recommended for production)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a required variable is missing or
    /// any value fails to parse (e.g., non-numeric PORT).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 8000)?,

            // Upstream provider
            provider_api_key: Self::require_env("PROVIDER_API_KEY")?,
            provider_base_url: env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| "http://www.kopis.or.kr/openApi/restful".to_string()),
            provider_timeout: Duration::from_secs(Self::parse_env("PROVIDER_TIMEOUT_SECS", 15)?),
            provider_category: env::var("PROVIDER_CATEGORY")
                .unwrap_or_else(|_| "CCCD".to_string()),

            // Tokens
            jwt_secret: Self::require_env("JWT_SECRET")?,
            jwt_algorithm: env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
            token_ttl_minutes: Self::parse_env("TOKEN_TTL_MINUTES", 10)?,

            // Rate limiting
            token_rate: RouteBudget {
                max_requests: Self::parse_env("TOKEN_RATE_LIMIT", 10)?,
                window: Duration::from_secs(Self::parse_env("TOKEN_RATE_WINDOW_SECS", 60)?),
            },
            listings_rate: RouteBudget {
                max_requests: Self::parse_env("LISTINGS_RATE_LIMIT", 50)?,
                window: Duration::from_secs(Self::parse_env("LISTINGS_RATE_WINDOW_SECS", 60)?),
            },

            // Security
            cors_allowed_origins: Self::parse_cors_origins(),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.token_ttl_minutes == 0 {
            return Err(AppError::ConfigError(
                "TOKEN_TTL_MINUTES must be greater than 0".to_string(),
            ));
        }

        if self.provider_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "PROVIDER_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        for (name, budget) in [
            ("TOKEN_RATE", &self.token_rate),
            ("LISTINGS_RATE", &self.listings_rate),
        ] {
            if budget.max_requests == 0 {
                return Err(AppError::ConfigError(format!(
                    "{name}_LIMIT must be greater than 0"
                )));
            }
            if budget.window.is_zero() {
                return Err(AppError::ConfigError(format!(
                    "{name}_WINDOW_SECS must be greater than 0"
                )));
            }
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Credential lifetime as a `Duration`.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_minutes * 60)
    }

    /// The per-route rate budget table. Routes absent from this map are
    /// not throttled.
    pub fn rate_budgets(&self) -> HashMap<String, RouteBudget> {
        HashMap::from([
            (TOKEN_ROUTE.to_string(), self.token_rate),
            (LISTINGS_ROUTE.to_string(), self.listings_rate),
        ])
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Read a required environment variable.
    fn require_env(name: &str) -> AppResult<String> {
        env::var(name)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::ConfigError(format!("{name} must be set")))
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 8000,
            // Upstream provider
            provider_api_key: "test-provider-key".to_string(),
            provider_base_url: "http://www.kopis.or.kr/openApi/restful".to_string(),
            provider_timeout: Duration::from_secs(15),
            provider_category: "CCCD".to_string(),
            // Tokens
            jwt_secret: "test-secret-at-least-32-characters-long".to_string(),
            jwt_algorithm: "HS256".to_string(),
            token_ttl_minutes: 10,
            // Rate limiting
            token_rate: RouteBudget {
                max_requests: 10,
                window: Duration::from_secs(60),
            },
            listings_rate: RouteBudget {
                max_requests: 50,
                window: Duration::from_secs(60),
            },
            // Security
            cors_allowed_origins: vec!["*".to_string()],
            // Observability
            log_level: "info".to_string(),
            metrics_port: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.token_ttl_minutes, 10);
        assert_eq!(config.token_rate.max_requests, 10);
        assert_eq!(config.listings_rate.max_requests, 50);
        assert_eq!(config.provider_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_server_addr_format() {
        let config = Config {
            host: "localhost".to_string(),
            port: 8000,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "localhost:8000");
    }

    #[test]
    fn test_token_ttl_in_seconds() {
        let config = Config {
            token_ttl_minutes: 10,
            ..Config::default()
        };

        assert_eq!(config.token_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn test_rate_budget_table_covers_throttled_routes() {
        let config = Config::default();
        let budgets = config.rate_budgets();

        assert_eq!(budgets.get(TOKEN_ROUTE).unwrap().max_requests, 10);
        assert_eq!(budgets.get(LISTINGS_ROUTE).unwrap().max_requests, 50);
        // /health is deliberately absent: unthrottled.
        assert!(!budgets.contains_key("/health"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = Config {
            token_ttl_minutes: 0,
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("TOKEN_TTL_MINUTES"));
    }

    #[test]
    fn test_validate_zero_budget() {
        let config = Config {
            listings_rate: RouteBudget {
                max_requests: 0,
                window: Duration::from_secs(60),
            },
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("LISTINGS_RATE"));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}

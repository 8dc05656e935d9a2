//! Stateless issuance and verification of short-lived bearer credentials.
//!
//! Tokens are compact JWS strings signed with a symmetric secret. A
//! credential carries a fixed issuer/audience pair identifying this service
//! and its frontend, a subject (user id or the anonymous marker), and an
//! expiry of `issued_at + ttl`. Nothing is persisted: verification is a pure
//! function of the token, the secret, and the clock, so expired tokens
//! simply fail verification and nothing needs purging.
//!
//! Every verification failure collapses into the single
//! [`AppError::AuthenticationFailed`] rejection. Callers cannot tell a bad
//! signature from a wrong audience from an expired token; the detail is
//! logged server-side only.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Fixed `iss` claim identifying this service.
pub const ISSUER: &str = "stagegate-api";

/// Fixed `aud` claim identifying the accepting frontend.
pub const AUDIENCE: &str = "stagegate-web";

/// Subject used when a token is issued without an authenticated user.
pub const ANONYMOUS_SUBJECT: &str = "anon";

/// Registered claims carried by every credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuing service, always [`ISSUER`].
    pub iss: String,
    /// User identifier, or [`ANONYMOUS_SUBJECT`].
    pub sub: String,
    /// Accepting frontend, always [`AUDIENCE`].
    pub aud: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, `iat + ttl`, seconds since the Unix epoch.
    pub exp: i64,
}

/// Issues and verifies signed, time-bounded bearer credentials.
///
/// Cheap to clone; the keys are shared behind `Arc`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    header: Header,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from a symmetric secret and an algorithm name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the algorithm name is unknown or
    /// is not an HMAC scheme (only symmetric signing is supported here).
    pub fn new(secret: &str, algorithm_name: &str, ttl: Duration) -> AppResult<Self> {
        let algorithm = Algorithm::from_str(algorithm_name).map_err(|_| {
            AppError::ConfigError(format!("unknown signing algorithm: {algorithm_name}"))
        })?;

        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AppError::ConfigError(format!(
                "signing algorithm {algorithm_name} requires an asymmetric key; \
                 only HS256/HS384/HS512 are supported"
            )));
        }

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        // No grace period: a token is invalid the second it expires.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            header: Header::new(algorithm),
            validation,
            ttl,
        })
    }

    /// Issue a signed credential for `subject`, defaulting to the anonymous
    /// marker. `iat` is the current time, `exp` is `iat + ttl`.
    pub fn issue(&self, subject: Option<&str>) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: subject.unwrap_or(ANONYMOUS_SUBJECT).to_string(),
            aud: AUDIENCE.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&self.header, &claims, &self.encoding_key).map_err(|e| {
            // Encoding only fails on key/serialization problems, never on input.
            AppError::Internal(format!("failed to sign token: {e}"))
        })
    }

    /// Validate signature, issuer, audience, and expiry.
    ///
    /// Identical checks to [`decode`](Self::decode); this simply discards
    /// the claims.
    pub fn verify(&self, token: &str) -> AppResult<()> {
        self.decode(token).map(|_| ())
    }

    /// Validate a token and return its claims.
    ///
    /// Applies the exact same signature/issuer/audience/expiry checks as
    /// [`verify`](Self::verify); there is no bypass path.
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token validation failed");
                AppError::AuthenticationFailed
            })
    }

    /// Credential lifetime in whole seconds, as reported to clients.
    pub fn expires_in_secs(&self) -> u64 {
        self.ttl.as_secs()
    }
}

//! Bearer token verification middleware.
//!
//! Protects a route group by validating the `Authorization: Bearer <token>`
//! header with the [`TokenService`]. Verification is stateless and read-only,
//! so the middleware needs no synchronization.
//!
//! On success the credential's subject is inserted into the request
//! extensions as [`AuthSubject`] so handlers can identify the caller. On any
//! failure - missing header, malformed bearer value, bad signature, wrong
//! audience or issuer, expired - the request is answered with the single
//! generic 401; which check failed is only logged server-side.
//!
//! Apply with `Router::route_layer` so it guards exactly the protected
//! routes; the rate limiter runs outside this layer, so unauthenticated
//! flooding is throttled before it reaches token verification.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response, header};
use axum::response::IntoResponse;
use tower::{Layer, Service};
use tracing::debug;

use crate::error::AppError;
use crate::token::TokenService;

/// The verified credential subject, available to handlers via
/// `Extension<AuthSubject>`.
#[derive(Debug, Clone)]
pub struct AuthSubject(pub String);

/// Bearer token authentication layer.
#[derive(Clone)]
pub struct BearerAuth {
    tokens: TokenService,
}

impl BearerAuth {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl<S> Layer<S> for BearerAuth {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            tokens: self.tokens.clone(),
        }
    }
}

/// Bearer token authentication service wrapper.
#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    tokens: TokenService,
}

impl<S> Service<Request<Body>> for BearerAuthService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let tokens = self.tokens.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(token) = bearer_token(&req) else {
                debug!(path = %req.uri().path(), "Missing or malformed Authorization header");
                return Ok(AppError::AuthenticationFailed.into_response());
            };

            match tokens.decode(token) {
                Ok(claims) => {
                    req.extensions_mut().insert(AuthSubject(claims.sub));
                    inner.call(req).await
                }
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// The scheme comparison is case-insensitive (`Bearer`, `bearer`, ...);
/// surrounding whitespace around the token is trimmed. Returns `None` for a
/// missing header, a non-bearer scheme, or an empty token.
fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

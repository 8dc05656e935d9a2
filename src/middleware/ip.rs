//! Client identity keys for rate limiting.
//!
//! The limiter buckets requests by the connecting client's network address.
//! Behind a reverse proxy the socket peer is the proxy itself, so the
//! forwarded headers are consulted first:
//!
//! 1. `X-Forwarded-For` (first entry of the comma-separated list)
//! 2. `X-Real-IP`
//! 3. The socket peer address (requires serving with
//!    `into_make_service_with_connect_info::<SocketAddr>()`)
//! 4. The shared [`UNKNOWN_CLIENT`] fallback
//!
//! # Security Warning
//!
//! The forwarded headers are client-controlled unless a trusted proxy
//! overwrites them. Deploy behind a proxy that does, or expose the service
//! directly so the socket peer is authoritative.
//!
//! # The "unknown" Fallback
//!
//! When no address can be determined at all, every such request shares one
//! budget key. Multiple unidentifiable clients then compete for a single
//! budget, which is accepted degradation rather than a correctness bug.

use std::borrow::Cow;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;

/// Shared budget key for requests with no identifiable client address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Extract the client identity key for a request.
///
/// Returns `Cow<'static, str>` - borrowed for the fallback (no allocation),
/// owned for actual addresses.
#[inline]
pub fn extract_client_ip<B>(req: &Request<B>) -> Cow<'static, str> {
    // X-Forwarded-For: "client, proxy1, proxy2" - the first entry is the
    // original client.
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return Cow::Owned(first.to_string());
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
    {
        let value = value.trim();
        if !value.is_empty() {
            return Cow::Owned(value.to_string());
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Cow::Owned(addr.ip().to_string());
    }

    Cow::Borrowed(UNKNOWN_CLIENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.50, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "203.0.113.50");
    }

    #[test]
    fn test_forwarded_for_trims_whitespace() {
        let req = Request::builder()
            .header("x-forwarded-for", "  192.168.1.1  , 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "192.168.1.1");
    }

    #[test]
    fn test_real_ip_used_when_no_forwarded_for() {
        let req = Request::builder()
            .header("x-real-ip", "198.51.100.7")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "198.51.100.7");
    }

    #[test]
    fn test_forwarded_for_has_priority_over_real_ip() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.50")
            .header("x-real-ip", "198.51.100.7")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "203.0.113.50");
    }

    #[test]
    fn test_connect_info_used_when_no_headers() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        let addr: SocketAddr = "127.0.0.1:54321".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        assert_eq!(extract_client_ip(&req), "127.0.0.1");
    }

    #[test]
    fn test_fallback_is_shared_unknown_key() {
        let req = Request::builder().body(Body::empty()).unwrap();

        let ip = extract_client_ip(&req);
        assert_eq!(ip, UNKNOWN_CLIENT);
        // Borrowed: the fallback allocates nothing.
        assert!(matches!(ip, Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let req = Request::builder()
            .header("x-forwarded-for", "   ")
            .header("x-real-ip", "198.51.100.7")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "198.51.100.7");
    }

    #[test]
    fn test_ipv6_addresses_pass_through() {
        let req = Request::builder()
            .header("x-forwarded-for", "2001:db8::1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "2001:db8::1");
    }
}

//! # Middleware Module
//!
//! Rate limiting for the BlueCarbon HTTP API, keyed per caller: each
//! wallet gets its own quota, so one greedy dashboard session cannot
//! starve everyone else. Requests without a wallet header share one
//! anonymous bucket.
//!
//! ## Configuration
//!
//! Rate limiting is configured via environment variable:
//! - `BLUECARBON_RATE_LIMIT`: Requests per second per caller (default: 100)

use super::wallet;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Default rate limit: 100 requests per second per caller.
const DEFAULT_RPS: NonZeroU32 = NonZeroU32::new(100).unwrap();

/// Bucket shared by requests that carry no wallet header.
const ANONYMOUS_CALLER: &str = "anonymous";

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Per-caller rate limiter type alias.
pub type ApiRateLimiter = Arc<RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>>;

/// Create a new per-caller rate limiter.
///
/// # Arguments
/// * `requests_per_second` - Maximum requests per second per caller
///
/// # Returns
/// A thread-safe keyed rate limiter wrapped in Arc.
pub fn create_rate_limiter(requests_per_second: u32) -> ApiRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    let quota = Quota::per_second(rps);
    Arc::new(RateLimiter::keyed(quota))
}

/// Get rate limit from environment variable.
///
/// Returns the value of `BLUECARBON_RATE_LIMIT` or 100 if not set.
pub fn get_rate_limit_from_env() -> u32 {
    std::env::var("BLUECARBON_RATE_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100)
}

/// The rate-limit bucket key for a request: the caller's wallet
/// address, or the shared anonymous bucket without one.
fn caller_key(headers: &HeaderMap) -> String {
    headers
        .get(wallet::WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .unwrap_or(ANONYMOUS_CALLER)
        .to_string()
}

/// Rate limiting middleware.
///
/// Checks the caller's bucket before allowing requests through.
/// Returns 429 Too Many Requests if the caller's limit is exceeded.
pub async fn rate_limit_middleware(
    State(limiter): State<ApiRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let caller = caller_key(request.headers());
    match limiter.check_key(&caller) {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(%caller, "Rate limit exceeded");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_create_rate_limiter() {
        let limiter = create_rate_limiter(50);
        // Should allow first request
        assert!(limiter.check_key(&"0x1".to_string()).is_ok());
    }

    #[test]
    fn test_create_rate_limiter_zero_defaults() {
        let limiter = create_rate_limiter(0);
        // Should use default of 100
        assert!(limiter.check_key(&ANONYMOUS_CALLER.to_string()).is_ok());
    }

    #[test]
    fn test_callers_have_independent_buckets() {
        let limiter = create_rate_limiter(1);
        let alice = "0xAAAA...0001".to_string();
        let bob = "0xBBBB...0002".to_string();

        assert!(limiter.check_key(&alice).is_ok());
        // Alice's bucket is drained; Bob's is untouched.
        assert!(limiter.check_key(&alice).is_err());
        assert!(limiter.check_key(&bob).is_ok());
    }

    #[test]
    fn test_caller_key_uses_wallet_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            wallet::WALLET_HEADER,
            HeaderValue::from_static("0x9876...4321"),
        );
        assert_eq!(caller_key(&headers), "0x9876...4321");
    }

    #[test]
    fn test_caller_key_falls_back_to_anonymous() {
        assert_eq!(caller_key(&HeaderMap::new()), ANONYMOUS_CALLER);

        let mut headers = HeaderMap::new();
        headers.insert(wallet::WALLET_HEADER, HeaderValue::from_static("   "));
        assert_eq!(caller_key(&headers), ANONYMOUS_CALLER);
    }
}

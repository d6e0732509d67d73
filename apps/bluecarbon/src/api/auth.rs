//! # Authentication Module
//!
//! API key authentication for the BlueCarbon HTTP API, with the public
//! explorer surface carved out: the dashboard's browse screens (project
//! explorer, marketplace listings, metadata cards) stay reachable
//! without a key, while wallet-bound and verifier endpoints require one.
//!
//! ## Configuration
//!
//! Authentication is configured via environment variable:
//! - `BLUECARBON_API_KEY`: If set, non-public endpoints require this key
//!
//! ## Usage
//!
//! Send the API key in the Authorization header:
//! ```text
//! Authorization: Bearer <your-api-key>
//! ```

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

// =============================================================================
// PUBLIC SURFACE
// =============================================================================

/// Whether an endpoint belongs to the public browse surface.
///
/// `/health` is always open (load balancer checks). Read-only explorer
/// and marketplace screens are open on GET: the project list and detail
/// pages, the listings board, and stored metadata documents. The
/// wizard, verifier reviews, purchases, balances, and registry
/// statistics all sit behind the key.
fn is_public_endpoint(method: &Method, path: &str) -> bool {
    if path == "/health" {
        return true;
    }
    if method != Method::GET {
        return false;
    }
    match path {
        "/projects" | "/listings" => true,
        _ => {
            let detail = path
                .strip_prefix("/projects/")
                .or_else(|| path.strip_prefix("/metadata/"));
            detail.is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
        }
    }
}

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// Get API key from environment variable.
///
/// Returns `Some(key)` if `BLUECARBON_API_KEY` is set and non-empty,
/// `None` otherwise (disabling authentication).
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var("BLUECARBON_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

/// Compare a provided key against the expected one in constant time.
///
/// Both keys are padded to the same length so `ct_eq` always runs over
/// the same number of bytes, preventing length-leaking side channels.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

/// API key authentication middleware.
///
/// If `BLUECARBON_API_KEY` is set:
/// - public browse endpoints (see [`is_public_endpoint`]) are always allowed
/// - all other endpoints require `Authorization: Bearer <key>` header
///
/// If `BLUECARBON_API_KEY` is not set, all requests are allowed.
pub async fn api_key_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let expected_key = get_api_key_from_env();

    // If no API key configured, allow all requests
    let Some(expected) = expected_key else {
        return Ok(next.run(request).await);
    };

    if is_public_endpoint(request.method(), request.uri().path()) {
        return Ok(next.run(request).await);
    }

    // Extract API key from Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            // Support both "Bearer <key>" and raw "<key>" formats
            let provided_key = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

            if keys_match(provided_key, &expected) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_api_key",
                    "Authentication failed: invalid API key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_api_key_empty_returns_none() {
        // Clear the env var if set
        // SAFETY: This is a unit test running in isolation.
        unsafe { std::env::remove_var("BLUECARBON_API_KEY") };
        assert!(get_api_key_from_env().is_none());
    }

    #[test]
    fn test_keys_match_exact_only() {
        assert!(keys_match("secret", "secret"));
        assert!(!keys_match("secret", "secre"));
        assert!(!keys_match("secrets", "secret"));
        assert!(!keys_match("", "secret"));
    }

    #[test]
    fn test_browse_endpoints_are_public() {
        assert!(is_public_endpoint(&Method::GET, "/health"));
        assert!(is_public_endpoint(&Method::GET, "/projects"));
        assert!(is_public_endpoint(&Method::GET, "/projects/3"));
        assert!(is_public_endpoint(&Method::GET, "/listings"));
        assert!(is_public_endpoint(
            &Method::GET,
            "/metadata/Qm0000000000000001"
        ));
    }

    #[test]
    fn test_wallet_and_verifier_endpoints_are_gated() {
        assert!(!is_public_endpoint(&Method::GET, "/status"));
        assert!(!is_public_endpoint(&Method::GET, "/reviews"));
        assert!(!is_public_endpoint(&Method::GET, "/balance"));
        assert!(!is_public_endpoint(&Method::POST, "/purchase"));
        assert!(!is_public_endpoint(&Method::POST, "/projects/3/review"));
        assert!(!is_public_endpoint(&Method::POST, "/wizard"));
        assert!(!is_public_endpoint(&Method::GET, "/wizard/1"));
        assert!(!is_public_endpoint(&Method::GET, "/projects/"));
    }
}

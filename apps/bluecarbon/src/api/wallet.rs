//! # Wallet Sessions
//!
//! The caller's wallet address travels in the `X-Wallet-Address`
//! header on every request that mutates marketplace state. There is no
//! ambient "connected" flag: each handler that needs a wallet extracts
//! it explicitly and answers 401 when it is missing.

use axum::http::{HeaderMap, StatusCode};
use bluecarbon_core::Address;

/// Header carrying the caller's wallet address.
pub const WALLET_HEADER: &str = "x-wallet-address";

/// Extract the wallet address from the request headers.
///
/// Returns 401 when the header is missing, empty, or not valid ASCII;
/// the dashboard shows its "connect wallet" card in that case.
pub fn require_wallet(headers: &HeaderMap) -> Result<Address, StatusCode> {
    let value = headers
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match value {
        Some(address) => Ok(Address::new(address)),
        None => {
            tracing::debug!("request rejected: no wallet session");
            Err(StatusCode::UNAUTHORIZED)
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
    fn missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert_eq!(require_wallet(&headers), Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn empty_header_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(WALLET_HEADER, HeaderValue::from_static("   "));
        assert_eq!(require_wallet(&headers), Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn present_header_yields_address() {
        let mut headers = HeaderMap::new();
        headers.insert(WALLET_HEADER, HeaderValue::from_static("0x1234...5678"));
        assert_eq!(
            require_wallet(&headers),
            Ok(Address::new("0x1234...5678"))
        );
    }
}

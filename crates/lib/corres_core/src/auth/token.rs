//! Bearer token encoding, decoding, and the expiry policy.
//!
//! Tokens are three dot-separated segments (marker, base64url JSON payload,
//! signature placeholder). Only the middle segment is ever decoded, and no
//! signature is checked — the auth service is a mock or sits behind TLS, so
//! the payload is already trusted when it reaches this client.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;

use super::AuthError;
use crate::models::auth::TokenClaims;

/// Tokens are treated as expired this many seconds before their nominal
/// expiry, so a refresh fires proactively rather than on the first 401.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Segment marker used by mock-issued tokens.
const MOCK_HEADER: &str = "mock";

/// Decode the claims embedded in a bearer token, without verifying any
/// signature.
pub fn decode(token: &str) -> Result<TokenClaims, AuthError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::TokenError(
            "expected three dot-separated segments".into(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::TokenError(format!("payload base64: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::TokenError(format!("payload json: {e}")))
}

/// Encode claims as an unsigned mock token: `mock.<payload>.signature`.
///
/// Only the mock auth service issues these; a real backend hands out
/// properly signed tokens in the same three-segment shape.
pub fn encode_mock(claims: &TokenClaims) -> Result<String, AuthError> {
    let payload = serde_json::to_vec(claims)
        .map_err(|e| AuthError::TokenError(format!("payload json: {e}")))?;
    Ok(format!(
        "{MOCK_HEADER}.{}.signature",
        URL_SAFE_NO_PAD.encode(payload)
    ))
}

/// Whether claims are expired at `now` (epoch seconds), applying the
/// 5-minute safety margin.
pub fn claims_expired_at(claims: &TokenClaims, now: i64) -> bool {
    claims.exp < now + EXPIRY_MARGIN_SECS
}

/// Whether a token is expired at `now`. A token that fails to decode is
/// expired by definition: when in doubt, require re-authentication.
pub fn expired_at(token: &str, now: i64) -> bool {
    match decode(token) {
        Ok(claims) => claims_expired_at(&claims, now),
        Err(e) => {
            tracing::warn!(error = %e, "undecodable token treated as expired");
            true
        }
    }
}

/// Whether a token is expired right now.
pub fn is_expired(token: &str) -> bool {
    expired_at(token, Utc::now().timestamp())
}

//! Access token decoding.
//!
//! Access tokens are JWT-shaped: `header.payload.signature`, where the payload
//! is base64url-encoded JSON carrying an `exp` claim in seconds since the epoch.
//! Only the expiry is read here. Signatures are the server's concern.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;

use crate::auth::{AuthError, AuthResult};

fn malformed(reason: impl Into<String>) -> AuthError {
    AuthError::MalformedToken(reason.into())
}

/// Extract the `exp` claim from an access token.
pub fn decode_expiry(token: &str) -> AuthResult<i64> {
    let mut segments = token.split('.');
    let (header, payload) = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(payload), Some(_signature), None) => (header, payload),
        _ => return Err(malformed("expected three dot-separated segments")),
    };
    if header.is_empty() || payload.is_empty() {
        return Err(malformed("empty header or payload segment"));
    }

    // Some issuers pad their segments even though JWT says not to.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| malformed(format!("payload is not base64url: {}", e)))?;
    let claims: Value = serde_json::from_slice(&bytes)
        .map_err(|e| malformed(format!("payload is not JSON: {}", e)))?;

    let exp = claims
        .get("exp")
        .ok_or_else(|| malformed("payload has no exp claim"))?;
    exp.as_i64()
        .or_else(|| exp.as_f64().map(|secs| secs.floor() as i64))
        .ok_or_else(|| malformed("exp claim is not a number"))
}

/// A token is fresh only while its expiry is strictly after `now`.
/// A token expiring this very second counts as expired.
pub fn is_fresh(expires_at: i64, now: i64) -> bool {
    expires_at > now
}

#![forbid(unsafe_code)]

//! Read the expiry out of a stored bearer token without verifying it.
//!
//! Restoring a session only needs to know whether the saved JWT is already
//! stale; the server remains the authority and answers 401 otherwise.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    exp: Option<u64>,
}

/// `exp` claim in Unix seconds, if the token is a JWT that carries one.
#[must_use]
pub fn expiry(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.exp
}

/// True when the token states an expiry at or before `now_secs`.
///
/// Opaque tokens without a readable `exp` are treated as live.
#[must_use]
pub fn is_expired(token: &str, now_secs: u64) -> bool {
    expiry(token).is_some_and(|exp| exp <= now_secs)
}

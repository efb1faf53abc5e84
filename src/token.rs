use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

use crate::error::Error;

/// Decides whether a bearer token may still be presented to the catalog API.
///
/// Implementations must be pure: no I/O, no shared mutable state. The gate calls
/// this once per protected request.
pub trait TokenValidator: Send + Sync + 'static {
    fn is_valid(&self, token: &str) -> bool;
}

/// Checks token shape and freshness against the system clock.
///
/// No signature verification is performed: the token is only ever forwarded to
/// the API that issued it, which verifies it on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiryValidator;

impl TokenValidator for ExpiryValidator {
    fn is_valid(&self, token: &str) -> bool {
        is_token_valid(token)
    }
}

/// Returns `true` if `token` is a well-formed JWT whose `exp` lies in the future.
///
/// Empty strings, malformed segments, undecodable payloads and missing `exp`
/// claims all yield `false`.
#[must_use]
pub fn is_token_valid(token: &str) -> bool {
    is_token_valid_at(token, OffsetDateTime::now_utc())
}

/// Same as [`is_token_valid`], evaluated at an explicit instant.
#[must_use]
pub fn is_token_valid_at(token: &str, now: OffsetDateTime) -> bool {
    match token_expiry(token) {
        Ok(expiry) => expiry > now,
        Err(_) => false,
    }
}

/// Extracts the `exp` claim of an unverified JWT as a UTC instant.
///
/// # Errors
///
/// Returns `Error::Token` if the token is not three base64url segments, if the
/// header or payload is not a JSON object, or if `exp` is missing or out of range.
pub fn token_expiry(token: &str) -> Result<OffsetDateTime, Error> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(Error::Token("invalid token format".into()));
    }

    let _header = decode_json_segment(parts[0], "header")?;
    let payload = decode_json_segment(parts[1], "payload")?;

    // Signature is opaque, but it must still be valid base64url.
    URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| Error::Token("invalid signature encoding".into()))?;

    let exp = payload
        .get("exp")
        .and_then(numeric_date)
        .ok_or_else(|| Error::Token("missing claim: exp".into()))?;

    OffsetDateTime::from_unix_timestamp(exp)
        .map_err(|e| Error::Token(format!("exp out of range: {e}")))
}

fn decode_json_segment(segment: &str, name: &str) -> Result<JsonValue, Error> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Error::Token(format!("invalid {name} encoding")))?;
    let value: JsonValue =
        serde_json::from_slice(&bytes).map_err(|_| Error::Token(format!("invalid {name}")))?;
    if !value.is_object() {
        return Err(Error::Token(format!("invalid {name}")));
    }
    Ok(value)
}

// NumericDate may be emitted as a float by some issuers.
fn numeric_date(value: &JsonValue) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}

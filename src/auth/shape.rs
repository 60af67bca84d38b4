//! Credential shape classification.
//!
//! Decides whether a presented credential should be treated as an internal
//! assertion or as an opaque legacy token. Never fails: anything that does
//! not parse is simply "not an assertion".

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;

/// Returns true when `token` looks like a compact signed assertion.
///
/// The token must have exactly three `.`-separated segments and the first
/// segment must decode to a JSON object with a string `alg` field.
pub fn looks_like_assertion(token: &str) -> bool {
    let mut segments = token.split('.');
    let header = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(_), Some(_), None) => header,
        _ => return false,
    };

    decode_json_segment(header)
        .and_then(|value| value.get("alg").map(Value::is_string))
        .unwrap_or(false)
}

/// Decode a base64url segment into a JSON object.
///
/// Returns `None` for bad base64, bad JSON, or a JSON value that is not an object.
pub(crate) fn decode_json_segment(segment: &str) -> Option<Value> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    value.is_object().then_some(value)
}

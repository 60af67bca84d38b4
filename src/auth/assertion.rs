//! Internal assertion (internal JWT) verification.
//!
//! Verification is a pure function of the token, the signing key, the
//! expected audience and the current time. Checks run in a fixed order and
//! stop at the first failure; the payload is not read until the signature
//! has been verified.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::auth::secret::{digest_eq, keyed_digest, Secret};
use crate::auth::shape::decode_json_segment;

/// The only accepted signing algorithm.
pub const ASSERTION_ALGORITHM: &str = "HS256";

/// Default tolerance between issuer and verifier clocks.
pub const DEFAULT_CLOCK_SKEW_SECONDS: i64 = 30;

/// Default maximum age of an assertion, measured from `iat`.
pub const DEFAULT_MAX_AGE_SECONDS: i64 = 120;

/// Why an assertion was rejected.
///
/// Each variant renders as its stable snake_case code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    #[error("invalid_format")]
    InvalidFormat,
    #[error("missing_parts")]
    MissingParts,
    #[error("invalid_header")]
    InvalidHeader,
    #[error("unsupported_algorithm")]
    UnsupportedAlgorithm,
    #[error("invalid_signature")]
    InvalidSignature,
    #[error("invalid_payload")]
    InvalidPayload,
    #[error("not_internal_token")]
    NotInternalToken,
    #[error("audience_mismatch")]
    AudienceMismatch,
    #[error("missing_iat")]
    MissingIat,
    #[error("iat_future")]
    IatFuture,
    #[error("iat_too_old")]
    IatTooOld,
    #[error("missing_exp")]
    MissingExp,
    #[error("token_expired")]
    TokenExpired,
    #[error("missing_request_id")]
    MissingRequestId,
}

/// Validated claims of an internal assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Service the assertion was issued for.
    #[serde(rename = "aud")]
    pub audience: String,
    /// Issued-at, epoch seconds.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiry, epoch seconds.
    #[serde(rename = "exp")]
    pub expires_at: i64,
    /// Always true for internal assertions.
    pub internal: bool,
    /// Request correlation id propagated downstream.
    #[serde(rename = "requestId")]
    pub correlation_id: String,
}

/// Verification parameters that are not part of the token.
#[derive(Debug, Clone, Copy)]
pub struct VerifyOptions<'a> {
    pub expected_audience: &'a str,
    /// Current time, epoch seconds.
    pub now: i64,
    pub clock_skew_seconds: i64,
    pub max_age_seconds: i64,
}

impl<'a> VerifyOptions<'a> {
    /// Options with the default skew and max age.
    pub fn new(expected_audience: &'a str, now: i64) -> Self {
        Self {
            expected_audience,
            now,
            clock_skew_seconds: DEFAULT_CLOCK_SKEW_SECONDS,
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }
}

/// Verify an internal assertion and return its claims.
pub fn verify(
    token: &str,
    signing_key: &Secret,
    options: &VerifyOptions<'_>,
) -> Result<AssertionClaims, FailureCode> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(FailureCode::InvalidFormat);
    };
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(FailureCode::MissingParts);
    }

    let header_json = decode_json_segment(header).ok_or(FailureCode::InvalidHeader)?;
    // Never let the token pick the algorithm.
    if header_json.get("alg").and_then(Value::as_str) != Some(ASSERTION_ALGORITHM) {
        return Err(FailureCode::UnsupportedAlgorithm);
    }

    verify_signature(header, payload, signature, signing_key)?;

    let claims = decode_json_segment(payload).ok_or(FailureCode::InvalidPayload)?;
    validate_claims(&claims, options)
}

/// Base64url signature of `header.payload` under `signing_key`.
pub(crate) fn sign(header: &str, payload: &str, signing_key: &[u8]) -> String {
    let signing_input = format!("{header}.{payload}");
    URL_SAFE_NO_PAD.encode(keyed_digest(signing_key, signing_input.as_bytes()))
}

fn verify_signature(
    header: &str,
    payload: &str,
    signature: &str,
    signing_key: &Secret,
) -> Result<(), FailureCode> {
    let expected = sign(header, payload, signing_key.expose());
    if digest_eq(signing_key.expose(), signature.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(FailureCode::InvalidSignature)
    }
}

fn validate_claims(claims: &Value, options: &VerifyOptions<'_>) -> Result<AssertionClaims, FailureCode> {
    if claims.get("internal") != Some(&Value::Bool(true)) {
        return Err(FailureCode::NotInternalToken);
    }

    let audience = claims
        .get("aud")
        .and_then(Value::as_str)
        .filter(|aud| *aud == options.expected_audience)
        .ok_or(FailureCode::AudienceMismatch)?;

    let now = options.now as f64;
    let skew = options.clock_skew_seconds as f64;

    let issued_at = claims
        .get("iat")
        .and_then(Value::as_f64)
        .ok_or(FailureCode::MissingIat)?;
    if issued_at > now + skew {
        return Err(FailureCode::IatFuture);
    }
    if issued_at < now - options.max_age_seconds as f64 {
        return Err(FailureCode::IatTooOld);
    }

    let expires_at = claims
        .get("exp")
        .and_then(Value::as_f64)
        .ok_or(FailureCode::MissingExp)?;
    // Inclusive: a token is already expired at exp + skew.
    if now >= expires_at + skew {
        return Err(FailureCode::TokenExpired);
    }

    let correlation_id = claims
        .get("requestId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(FailureCode::MissingRequestId)?;

    Ok(AssertionClaims {
        audience: audience.to_string(),
        issued_at: issued_at as i64,
        expires_at: expires_at as i64,
        internal: true,
        correlation_id: correlation_id.to_string(),
    })
}

//! Minting of internal assertions for outbound service calls.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::auth::{AssertionClaims, Secret};
use crate::error::{GateError, GateResult};

/// Default lifetime of an issued assertion.
#[allow(dead_code)]
pub const DEFAULT_TTL_SECONDS: i64 = 60;

/// Signs internal assertions for a single target audience.
///
/// Produces the same wire format the gate verifies: HS256, `aud`, `iat`,
/// `exp`, `internal: true` and `requestId`.
#[allow(dead_code)]
#[derive(Clone)]
pub struct AssertionIssuer {
    encoding_key: EncodingKey,
    audience: String,
    ttl_seconds: i64,
}

#[allow(dead_code)]
impl AssertionIssuer {
    /// Create an issuer for calls to `audience`.
    pub fn new(signing_key: &Secret, audience: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key.expose()),
            audience: audience.into(),
            ttl_seconds,
        }
    }

    /// Issue an assertion carrying `correlation_id`, valid from now.
    pub fn issue(&self, correlation_id: &str) -> GateResult<String> {
        self.issue_at(correlation_id, Utc::now().timestamp())
    }

    /// Issue an assertion as of `now` (epoch seconds).
    pub fn issue_at(&self, correlation_id: &str, now: i64) -> GateResult<String> {
        let claims = AssertionClaims {
            audience: self.audience.clone(),
            issued_at: now,
            expires_at: now + self.ttl_seconds,
            internal: true,
            correlation_id: correlation_id.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| GateError::Internal(format!("Failed to sign assertion: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::{AUDIENCE, KEY, NOW};
    use crate::auth::shape::looks_like_assertion;
    use crate::auth::{verify, FailureCode, VerifyOptions};

    fn issuer(audience: &str) -> AssertionIssuer {
        AssertionIssuer::new(&Secret::new(KEY).unwrap(), audience, DEFAULT_TTL_SECONDS)
    }

    #[test]
    fn test_issued_assertion_verifies() {
        let token = issuer(AUDIENCE).issue_at("req-issued", NOW).unwrap();
        assert!(looks_like_assertion(&token));

        let claims = verify(
            &token,
            &Secret::new(KEY).unwrap(),
            &VerifyOptions::new(AUDIENCE, NOW),
        )
        .unwrap();
        assert_eq!(claims.correlation_id, "req-issued");
        assert_eq!(claims.issued_at, NOW);
        assert_eq!(claims.expires_at, NOW + DEFAULT_TTL_SECONDS);
        assert!(claims.internal);
    }

    #[test]
    fn test_issued_for_other_service() {
        let token = issuer("payments-service").issue_at("req-1", NOW).unwrap();
        let result = verify(
            &token,
            &Secret::new(KEY).unwrap(),
            &VerifyOptions::new(AUDIENCE, NOW),
        );
        assert_eq!(result, Err(FailureCode::AudienceMismatch));
    }

    #[test]
    fn test_issue_uses_wall_clock() {
        let token = tokio_test::assert_ok!(issuer(AUDIENCE).issue("req-live"));
        let now = Utc::now().timestamp();
        tokio_test::assert_ok!(verify(
            &token,
            &Secret::new(KEY).unwrap(),
            &VerifyOptions::new(AUDIENCE, now),
        ));
    }
}

//! The request-facing authentication gate.
//!
//! Per request:
//! 1. configuration check (misconfigured -> reject, nothing else runs)
//! 2. no credential -> unauthenticated
//! 3. assertion-shaped and a signing key is configured -> verify assertion;
//!    on failure strict mode rejects, hybrid mode falls through
//! 4. legacy secret configured and permitted -> constant-time compare
//!
//! Nothing is retried: the outcome is a pure function of the credential,
//! the configuration and the clock.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::assertion::{self, FailureCode, VerifyOptions};
use crate::auth::policy::{AssertionFailureAction, AuthConfig, AuthPolicy, ConfigFault};
use crate::auth::{secret, shape};

/// Which verifier accepted the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Assertion,
    LegacySecret,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Assertion => write!(f, "assertion"),
            AuthMethod::LegacySecret => write!(f, "legacy_secret"),
        }
    }
}

/// Caller-facing reason for a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenyCode {
    /// No credential presented.
    Unauthenticated,
    /// Credential presented but not accepted.
    Forbidden,
    /// Server-side fault: no usable secret for the active mode.
    Misconfigured,
}

impl std::fmt::Display for DenyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyCode::Unauthenticated => write!(f, "unauthenticated"),
            DenyCode::Forbidden => write!(f, "forbidden"),
            DenyCode::Misconfigured => write!(f, "misconfigured"),
        }
    }
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub allowed: bool,
    pub failure_code: Option<DenyCode>,
    /// Set on allow: the assertion's `requestId`, or a fresh id for legacy callers.
    pub correlation_id: Option<String>,
    pub method: Option<AuthMethod>,
    /// Verifiers that ran, in order.
    pub attempted: Vec<AuthMethod>,
    /// Specific reason the assertion was rejected, for logs only.
    pub assertion_failure: Option<FailureCode>,
    /// Specific configuration fault, for logs only.
    pub config_fault: Option<ConfigFault>,
}

impl AuthDecision {
    fn allow(method: AuthMethod, correlation_id: String, attempted: Vec<AuthMethod>) -> Self {
        Self {
            allowed: true,
            failure_code: None,
            correlation_id: Some(correlation_id),
            method: Some(method),
            attempted,
            assertion_failure: None,
            config_fault: None,
        }
    }

    fn deny(code: DenyCode) -> Self {
        Self {
            allowed: false,
            failure_code: Some(code),
            correlation_id: None,
            method: None,
            attempted: Vec::new(),
            assertion_failure: None,
            config_fault: None,
        }
    }
}

/// Stateless authentication gate over an immutable [`AuthConfig`].
///
/// Cheap to clone and safe to share between any number of request tasks.
#[derive(Debug, Clone)]
pub struct AuthGate {
    policy: AuthPolicy,
}

impl AuthGate {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            policy: AuthPolicy::new(config),
        }
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Evaluate a presented credential against the wall clock.
    pub fn evaluate(&self, credential: Option<&str>) -> AuthDecision {
        self.evaluate_at(credential, Utc::now().timestamp())
    }

    /// Evaluate a presented credential as of `now` (epoch seconds).
    pub fn evaluate_at(&self, credential: Option<&str>, now: i64) -> AuthDecision {
        if let Err(fault) = self.policy.check_configuration() {
            let mut decision = AuthDecision::deny(DenyCode::Misconfigured);
            decision.config_fault = Some(fault);
            return decision;
        }

        let Some(token) = credential else {
            return AuthDecision::deny(DenyCode::Unauthenticated);
        };

        let mut attempted = Vec::with_capacity(2);
        let mut assertion_failure = None;

        if let Some(signing_key) = self.policy.signing_key() {
            if shape::looks_like_assertion(token) {
                attempted.push(AuthMethod::Assertion);
                let config = self.policy.config();
                let options = VerifyOptions {
                    expected_audience: &config.expected_audience,
                    now,
                    clock_skew_seconds: config.clock_skew_seconds,
                    max_age_seconds: config.max_age_seconds,
                };

                match assertion::verify(token, signing_key, &options) {
                    Ok(claims) => {
                        return AuthDecision::allow(
                            AuthMethod::Assertion,
                            claims.correlation_id,
                            attempted,
                        );
                    }
                    Err(code) => {
                        assertion_failure = Some(code);
                        if self.policy.on_assertion_failure() == AssertionFailureAction::Reject {
                            return self.forbidden(attempted, assertion_failure);
                        }
                    }
                }
            }
        }

        if let Some(legacy) = self.policy.legacy_secret() {
            attempted.push(AuthMethod::LegacySecret);
            if secret::matches(token, legacy) {
                // The legacy scheme carries no correlation id.
                return AuthDecision::allow(
                    AuthMethod::LegacySecret,
                    Uuid::new_v4().to_string(),
                    attempted,
                );
            }
        }

        self.forbidden(attempted, assertion_failure)
    }

    fn forbidden(
        &self,
        attempted: Vec<AuthMethod>,
        assertion_failure: Option<FailureCode>,
    ) -> AuthDecision {
        let mut decision = AuthDecision::deny(DenyCode::Forbidden);
        decision.attempted = attempted;
        decision.assertion_failure = assertion_failure;
        decision
    }
}

//! Trust policy: which verifiers may run, and what a failure means.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::assertion::{DEFAULT_CLOCK_SKEW_SECONDS, DEFAULT_MAX_AGE_SECONDS};
use crate::auth::Secret;
use crate::config::AuthSettings;
use crate::error::{GateError, GateResult};

/// Active trust mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Only signed internal assertions are accepted.
    Strict,
    /// Assertions first, then the legacy shared secret. Migration only.
    #[default]
    Hybrid,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Strict => write!(f, "strict"),
            AuthMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(AuthMode::Strict),
            "hybrid" => Ok(AuthMode::Hybrid),
            _ => Err(format!("Unknown auth mode: {}", s)),
        }
    }
}

/// Immutable authentication configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub signing_key: Option<Secret>,
    pub legacy_secret: Option<Secret>,
    /// Identifier of this service; assertions must name it in `aud`.
    pub expected_audience: String,
    pub clock_skew_seconds: i64,
    pub max_age_seconds: i64,
}

impl AuthConfig {
    /// Configuration with no secrets and the default freshness window.
    pub fn new(mode: AuthMode, expected_audience: impl Into<String>) -> Self {
        Self {
            mode,
            signing_key: None,
            legacy_secret: None,
            expected_audience: expected_audience.into(),
            clock_skew_seconds: DEFAULT_CLOCK_SKEW_SECONDS,
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }

    #[cfg(test)]
    pub fn with_signing_key(mut self, key: impl Into<String>) -> Self {
        self.signing_key = Secret::new(key);
        self
    }

    #[cfg(test)]
    pub fn with_legacy_secret(mut self, secret: impl Into<String>) -> Self {
        self.legacy_secret = Secret::new(secret);
        self
    }

    /// Build from loaded settings. Empty secrets count as absent.
    pub fn from_settings(settings: &AuthSettings) -> GateResult<Self> {
        if settings.clock_skew_seconds < 0 || settings.max_age_seconds < 0 {
            return Err(GateError::Config(
                "clock_skew_seconds and max_age_seconds must not be negative".to_string(),
            ));
        }

        let mut config = Self::new(settings.mode, settings.expected_audience.trim());
        config.signing_key = settings.signing_key.clone().and_then(Secret::new);
        config.legacy_secret = settings.legacy_secret.clone().and_then(Secret::new);
        config.clock_skew_seconds = settings.clock_skew_seconds;
        config.max_age_seconds = settings.max_age_seconds;
        Ok(config)
    }
}

/// Why the configuration cannot serve requests. Logged, never returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigFault {
    #[error("strict mode requires a signing key")]
    MissingSigningKey,
    #[error("hybrid mode requires a signing key or a legacy secret")]
    NoCredentialConfigured,
    #[error("expected audience is empty")]
    MissingAudience,
}

/// What to do after an assertion fails verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionFailureAction {
    Reject,
    FallBackToLegacy,
}

/// Decisions derived from an [`AuthConfig`].
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    config: Arc<AuthConfig>,
}

impl AuthPolicy {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn mode(&self) -> AuthMode {
        self.config.mode
    }

    /// Check that the active mode has something to verify against.
    pub fn check_configuration(&self) -> Result<(), ConfigFault> {
        let config = &self.config;
        if config.expected_audience.is_empty() {
            return Err(ConfigFault::MissingAudience);
        }
        match config.mode {
            AuthMode::Strict if config.signing_key.is_none() => Err(ConfigFault::MissingSigningKey),
            AuthMode::Hybrid if config.signing_key.is_none() && config.legacy_secret.is_none() => {
                Err(ConfigFault::NoCredentialConfigured)
            }
            _ => Ok(()),
        }
    }

    /// Signing key for assertion verification, if configured.
    pub fn signing_key(&self) -> Option<&Secret> {
        self.config.signing_key.as_ref()
    }

    /// Legacy secret, only when the mode permits the legacy scheme.
    pub fn legacy_secret(&self) -> Option<&Secret> {
        match self.config.mode {
            AuthMode::Hybrid => self.config.legacy_secret.as_ref(),
            AuthMode::Strict => None,
        }
    }

    pub fn on_assertion_failure(&self) -> AssertionFailureAction {
        match self.config.mode {
            AuthMode::Strict => AssertionFailureAction::Reject,
            AuthMode::Hybrid => AssertionFailureAction::FallBackToLegacy,
        }
    }
}

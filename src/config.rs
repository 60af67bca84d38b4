//! Configuration module for the internal gate.
//!
//! Loads configuration from YAML files and environment variables, once, at
//! process start.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::auth::{
    AuthMode, DEFAULT_CLOCK_SKEW_SECONDS, DEFAULT_MAX_AGE_SECONDS, INTERNAL_TOKEN_HEADER,
};

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Raw authentication settings, as loaded.
///
/// Converted into an immutable `AuthConfig` before any request is served.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// `strict` or `hybrid`.
    pub mode: AuthMode,
    /// Key for verifying internal assertions.
    pub signing_key: Option<String>,
    /// Static shared secret accepted during migration (hybrid mode only).
    pub legacy_secret: Option<String>,
    /// Identifier of this service instance.
    pub expected_audience: String,
    /// Header carrying the credential.
    pub header_name: String,
    pub clock_skew_seconds: i64,
    pub max_age_seconds: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            signing_key: None,
            legacy_secret: None,
            expected_audience: String::new(),
            header_name: INTERNAL_TOKEN_HEADER.to_string(),
            clock_skew_seconds: DEFAULT_CLOCK_SKEW_SECONDS,
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }
}

// Secrets stay out of `{:?}` output.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("mode", &self.mode)
            .field("signing_key_set", &self.signing_key.is_some())
            .field("legacy_secret_set", &self.legacy_secret.is_some())
            .field("expected_audience", &self.expected_audience)
            .field("header_name", &self.header_name)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .field("max_age_seconds", &self.max_age_seconds)
            .finish()
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (GATE_*, `__` as separator)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        config.try_deserialize()
    }
}

/// `GATE__SECTION__KEY` overrides.
///
/// Values stay strings: secrets and the audience must arrive byte-for-byte.
/// Numeric fields are converted during deserialization.
fn environment() -> Environment {
    Environment::with_prefix("GATE").separator("__")
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_yaml(yaml: &str) -> Config {
        ConfigLoader::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_when_auth_section_missing() {
        let config = from_yaml("server:\n  host: 127.0.0.1\n  port: 8080\n");
        assert_eq!(config.auth.mode, AuthMode::Hybrid);
        assert_eq!(config.auth.header_name, "x-internal-token");
        assert_eq!(config.auth.clock_skew_seconds, 30);
        assert_eq!(config.auth.max_age_seconds, 120);
        assert!(config.auth.signing_key.is_none());
    }

    #[test]
    fn test_auth_section() {
        let config = from_yaml(
            r#"
server:
  host: 0.0.0.0
  port: 9000
auth:
  mode: strict
  signing_key: s3cr3t
  expected_audience: billing-service
  max_age_seconds: 300
"#,
        );
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.mode, AuthMode::Strict);
        assert_eq!(config.auth.signing_key.as_deref(), Some("s3cr3t"));
        assert_eq!(config.auth.expected_audience, "billing-service");
        assert_eq!(config.auth.max_age_seconds, 300);
        assert_eq!(config.auth.clock_skew_seconds, 30);
    }

    #[test]
    fn test_env_overrides_keep_numeric_looking_strings() {
        let vars: config::Map<String, String> = [
            ("GATE__AUTH__SIGNING_KEY", "007123"),
            ("GATE__AUTH__LEGACY_SECRET", "1e3"),
            ("GATE__AUTH__EXPECTED_AUDIENCE", "0042"),
            ("GATE__AUTH__CLOCK_SKEW_SECONDS", "45"),
            ("GATE__SERVER__PORT", "9100"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config: Config = ConfigLoader::builder()
            .add_source(File::from_str(
                "server:\n  host: 127.0.0.1\n  port: 8080\n",
                FileFormat::Yaml,
            ))
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.auth.signing_key.as_deref(), Some("007123"));
        assert_eq!(config.auth.legacy_secret.as_deref(), Some("1e3"));
        assert_eq!(config.auth.expected_audience, "0042");
        assert_eq!(config.auth.clock_skew_seconds, 45);
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let settings = AuthSettings {
            signing_key: Some("s3cr3t".to_string()),
            legacy_secret: Some("legacy-value".to_string()),
            ..AuthSettings::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("s3cr3t"));
        assert!(!rendered.contains("legacy-value"));
        assert!(rendered.contains("signing_key_set: true"));
    }
}

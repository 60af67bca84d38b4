//! Internal Gate - trust boundary for service-to-service calls.
//!
//! Verifies short-lived signed internal assertions and, during migration,
//! a legacy shared secret, before a call reaches the protected service.

use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod error;
mod logging;

use crate::api::build_router;
use crate::auth::{AuthConfig, AuthGate, AuthMode, InternalAuth};
use crate::config::Config;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Active trust mode, reported by the health endpoint.
    pub auth_mode: AuthMode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting Internal Gate v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        auth = ?config.auth,
        "Configuration loaded"
    );

    // Built once; every request shares it read-only.
    let auth_config = AuthConfig::from_settings(&config.auth)?;
    let auth = InternalAuth::new(AuthGate::new(auth_config), &config.auth.header_name)?;

    let policy = auth.gate().policy();
    match policy.check_configuration() {
        Ok(()) => tracing::info!(
            mode = %policy.mode(),
            audience = %policy.config().expected_audience,
            assertions = policy.signing_key().is_some(),
            legacy_secret = policy.legacy_secret().is_some(),
            "Internal authentication enabled"
        ),
        // Requests are rejected individually; the process keeps serving.
        Err(fault) => tracing::error!(
            mode = %policy.mode(),
            fault = %fault,
            "Internal authentication is misconfigured - all protected requests will be rejected"
        ),
    }
    if policy.legacy_secret().is_some() {
        tracing::warn!("Legacy shared secret accepted (hybrid mode) - switch to strict once migration completes");
    }

    let state = AppState {
        auth_mode: policy.mode(),
    };
    let app = build_router(state, auth);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

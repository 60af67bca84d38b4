//! HTTP request handlers.

use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::api::types::*;
use crate::auth::AuthContext;
use crate::AppState;

/// Health check endpoint.
///
/// GET /v1/health
#[utoipa::path(
    get,
    path = "/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        auth_mode: state.auth_mode,
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Echo the identity the gate resolved for this call.
///
/// GET /v1/internal/whoami
#[utoipa::path(
    get,
    path = "/v1/internal/whoami",
    responses(
        (status = 200, description = "Caller authenticated", body = WhoAmIResponse),
        (status = 401, description = "Credential missing", body = crate::error::ErrorResponse),
        (status = 403, description = "Credential rejected", body = crate::error::ErrorResponse),
        (status = 500, description = "Authentication misconfigured", body = crate::error::ErrorResponse)
    ),
    security(("internal_token" = [])),
    tag = "internal"
)]
pub async fn whoami(Extension(context): Extension<AuthContext>) -> Json<WhoAmIResponse> {
    tracing::info!(correlation_id = %context.correlation_id, "Internal caller identified");

    Json(WhoAmIResponse {
        correlation_id: context.correlation_id,
        method: context.method,
    })
}

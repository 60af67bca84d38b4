//! Route definitions for the API.

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::{require_internal_auth, InternalAuth, INTERNAL_TOKEN_HEADER};
use crate::AppState;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "internal_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    INTERNAL_TOKEN_HEADER,
                    "Internal assertion (HS256 JWT) or, in hybrid mode, the legacy shared secret",
                ))),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health_check, handlers::whoami),
    components(schemas(
        crate::api::types::HealthResponse,
        crate::api::types::WhoAmIResponse,
        crate::error::ErrorResponse,
        crate::auth::AuthMethod,
        crate::auth::AuthMode,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "internal", description = "Routes behind the internal auth gate"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Internal Gate API",
        version = "0.1.0",
        description = "Trust boundary for service-to-service calls",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router with the internal auth gate in front of `/v1/internal`.
pub fn build_router(state: AppState, auth: InternalAuth) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes requiring an internal credential
    let internal_routes = Router::new()
        .route("/v1/internal/whoami", get(handlers::whoami))
        .layer(middleware::from_fn_with_state(auth, require_internal_auth))
        .with_state(state.clone());

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        .with_state(state);

    Router::new()
        .merge(internal_routes)
        .merge(public_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

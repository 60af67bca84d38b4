//! Request and response types for the API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthMethod, AuthMode};

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Active trust mode.
    pub auth_mode: AuthMode,
    /// Timestamp.
    pub timestamp: String,
}

/// Identity of an authenticated internal caller.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WhoAmIResponse {
    /// Correlation id resolved by the gate.
    pub correlation_id: String,
    /// Scheme that authenticated the call.
    pub method: AuthMethod,
}

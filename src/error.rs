//! Error types for the internal gate.
//!
//! Defines a unified error type that maps cleanly to HTTP responses.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::{DenyCode, REQUEST_ID_HEADER};

/// Unified error type for gate operations.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Authentication required")]
    Unauthenticated { correlation_id: String },

    #[error("Credential rejected")]
    Forbidden { correlation_id: String },

    #[error("Authentication is not configured")]
    Misconfigured { correlation_id: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Map a gate denial to its error.
    pub fn denied(code: DenyCode, correlation_id: String) -> Self {
        match code {
            DenyCode::Unauthenticated => GateError::Unauthenticated { correlation_id },
            DenyCode::Forbidden => GateError::Forbidden { correlation_id },
            DenyCode::Misconfigured => GateError::Misconfigured { correlation_id },
        }
    }

    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            GateError::Unauthenticated { correlation_id }
            | GateError::Forbidden { correlation_id }
            | GateError::Misconfigured { correlation_id } => Some(correlation_id),
            GateError::Config(_) | GateError::Internal(_) => None,
        }
    }
}

/// Error response body for API clients.
///
/// Carries only symbolic codes and the correlation id, never credential
/// or claim values.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GateError::Unauthenticated { .. } => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Missing internal credential",
            ),
            GateError::Forbidden { .. } => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Invalid internal credential",
            ),
            GateError::Misconfigured { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "misconfigured",
                "Internal authentication is not configured",
            ),
            GateError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "config_error",
                    "Configuration error",
                )
            }
            GateError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred",
                )
            }
        };

        let correlation_id = self.correlation_id().map(String::from);
        let header = correlation_id
            .as_deref()
            .and_then(|id| HeaderValue::from_str(id).ok());

        let body = ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            correlation_id,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = header {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
}

/// Result type alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_status_codes() {
        let cases = [
            (DenyCode::Unauthenticated, StatusCode::UNAUTHORIZED),
            (DenyCode::Forbidden, StatusCode::FORBIDDEN),
            (DenyCode::Misconfigured, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (code, status) in cases {
            let response = GateError::denied(code, "corr-1".to_string()).into_response();
            assert_eq!(response.status(), status);
            assert_eq!(response.headers()[REQUEST_ID_HEADER], "corr-1");
        }
    }

    #[test]
    fn test_config_error_has_no_correlation_id() {
        let error = GateError::Config("bad".to_string());
        assert_eq!(error.correlation_id(), None);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(REQUEST_ID_HEADER).is_none());
    }
}

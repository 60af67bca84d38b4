//! Authentication middleware for axum.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{AuthDecision, AuthGate, AuthMethod, DenyCode};
use crate::error::{GateError, GateResult};

/// Default header carrying the internal credential.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Header used to propagate the correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound request id reused for a failed attempt.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Authentication info attached to request extensions on allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub correlation_id: String,
    pub method: AuthMethod,
}

/// State for [`require_internal_auth`].
#[derive(Clone)]
pub struct InternalAuth {
    gate: Arc<AuthGate>,
    header: HeaderName,
}

impl InternalAuth {
    /// Build middleware state reading the credential from `header_name`.
    pub fn new(gate: AuthGate, header_name: &str) -> GateResult<Self> {
        let header = HeaderName::try_from(header_name.trim().to_ascii_lowercase())
            .map_err(|e| GateError::Config(format!("Invalid credential header name: {}", e)))?;

        Ok(Self {
            gate: Arc::new(gate),
            header,
        })
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }
}

/// Verify the internal credential before the request reaches its handler.
///
/// Reads the credential header once. On allow, inserts an [`AuthContext`]
/// and sets `x-request-id` on both the forwarded request and the response.
pub async fn require_internal_auth(
    State(auth): State<InternalAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let credential = read_credential(request.headers(), &auth.header);
    let decision = auth.gate.evaluate(credential.as_deref());

    let (Some(method), Some(correlation_id)) = (decision.method, decision.correlation_id.clone())
    else {
        let correlation_id =
            inbound_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
        log_denial(&request, &decision, &correlation_id);
        let code = decision.failure_code.unwrap_or(DenyCode::Forbidden);
        return Err(GateError::denied(code, correlation_id));
    };

    tracing::debug!(
        method = %request.method(),
        path = %request.uri().path(),
        correlation_id = %correlation_id,
        auth_method = %method,
        "Internal call authenticated"
    );

    let header_value = HeaderValue::from_str(&correlation_id).ok();
    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }
    request.extensions_mut().insert(AuthContext {
        correlation_id,
        method,
    });

    let mut response = next.run(request).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    Ok(response)
}

/// Present, non-blank header value, byte-for-byte. Non-UTF-8 bytes are kept
/// (lossily) so they are rejected as an invalid credential rather than
/// treated as absent.
fn read_credential(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let value = headers.get(name)?;
    let credential = match value.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };
    (!credential.trim().is_empty()).then_some(credential)
}

fn inbound_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(String::from)
}

fn log_denial(request: &Request, decision: &AuthDecision, correlation_id: &str) {
    let method = request.method();
    let path = request.uri().path();
    let assertion_failure = decision.assertion_failure.map(|code| code.to_string());

    match decision.failure_code {
        Some(DenyCode::Misconfigured) => tracing::error!(
            method = %method,
            path = %path,
            correlation_id = %correlation_id,
            fault = ?decision.config_fault,
            "Internal auth misconfigured, rejecting request"
        ),
        code => tracing::warn!(
            method = %method,
            path = %path,
            correlation_id = %correlation_id,
            outcome = ?code,
            attempted = ?decision.attempted,
            assertion_failure = assertion_failure.as_deref().unwrap_or("none"),
            "Internal call rejected"
        ),
    }
}

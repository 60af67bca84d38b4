//! Internal service authentication.
//!
//! Two credential schemes are understood:
//! - Internal assertion: a short-lived HS256-signed JWT bound to this service
//! - Legacy shared secret: a static token, accepted only in hybrid mode

mod assertion;
mod gate;
mod issuer;
mod middleware;
mod policy;
mod secret;
mod shape;

pub use assertion::*;
pub use gate::*;
pub use issuer::*;
pub use middleware::*;
pub use policy::*;
pub use secret::Secret;

/// Token builders shared by the unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use serde_json::{json, Value};

    use super::assertion::sign;

    pub const KEY: &str = "internal-signing-key-for-tests";
    pub const LEGACY: &str = "legacy-shared-secret";
    pub const AUDIENCE: &str = "billing-service";
    pub const NOW: i64 = 1_700_000_000;

    /// Claims that verify at `NOW` for `AUDIENCE`.
    pub fn valid_payload() -> Value {
        json!({
            "aud": AUDIENCE,
            "iat": NOW,
            "exp": NOW + 60,
            "internal": true,
            "requestId": "req-7f3a",
        })
    }

    /// Encode and sign arbitrary header and payload JSON.
    pub fn forge(header: &Value, payload: &Value, key: &[u8]) -> String {
        let header = URL_SAFE_NO_PAD.encode(header.to_string());
        let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
        let signature = sign(&header, &payload, key);
        format!("{header}.{payload}.{signature}")
    }

    pub fn valid_token() -> String {
        forge(&json!({"alg": "HS256", "typ": "JWT"}), &valid_payload(), KEY.as_bytes())
    }
}

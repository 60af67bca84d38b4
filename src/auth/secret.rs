//! Secret handling and legacy shared-secret verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// A configured secret value.
///
/// Never empty. `Debug` output is redacted so secrets cannot end up in logs
/// through a stray `?config`.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret, treating empty or whitespace-only values as absent.
    ///
    /// Otherwise the value is kept byte-for-byte, surrounding whitespace included.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Raw secret bytes.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// HMAC-SHA256 of `data` under `key`.
pub(crate) fn keyed_digest(key: &[u8], data: &[u8]) -> impl AsRef<[u8]> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes()
}

/// Compare two byte strings in constant time after normalizing both to
/// fixed-length keyed digests.
///
/// Neither the running time nor any early exit depends on the inputs'
/// lengths or on where they first differ.
pub(crate) fn digest_eq(key: &[u8], left: &[u8], right: &[u8]) -> bool {
    let left = keyed_digest(key, left);
    let right = keyed_digest(key, right);
    left.as_ref().ct_eq(right.as_ref()).into()
}

/// Check a presented opaque token against the configured legacy secret.
pub fn matches(provided: &str, expected: &Secret) -> bool {
    digest_eq(expected.expose(), provided.as_bytes(), expected.expose())
}

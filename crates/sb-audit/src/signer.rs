// signer.rs — Deterministic canonical encoding and HMAC signing.
//
// The transport may re-serialize a record with arbitrary key ordering, so
// signatures are computed over a canonical form: the record converted to a
// serde_json::Value (whose object maps are BTreeMaps — keys always sorted)
// with the signature fields nulled, serialized compactly. Verification
// rebuilds the same bytes and compares in constant time via ring.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use ring::hmac;
use serde_json::Value;
use thiserror::Error;

/// Algorithm label attached to signatures.
pub const DEFAULT_ALGORITHM: &str = "HS256";

/// Environment variable carrying the HMAC secret.
pub const SIGNING_KEY_ENV: &str = "AUDIT_SIGNING_KEY";

const DEV_SIGNING_KEY: &str = "switchboard-dev-key";

/// A payload could not be brought into canonical form.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("unable to encode payload for signing: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A computed signature plus its algorithm label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSignature {
    pub algorithm: String,
    pub signature: String,
}

/// HMAC-SHA256 signer with a process-wide secret.
pub struct AuditSigner {
    key: hmac::Key,
}

impl AuditSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    /// Key from `AUDIT_SIGNING_KEY`, with a development fallback.
    pub fn from_env() -> Self {
        let secret =
            std::env::var(SIGNING_KEY_ENV).unwrap_or_else(|_| DEV_SIGNING_KEY.to_string());
        Self::new(secret.as_bytes())
    }

    /// The canonical byte encoding of a payload.
    pub fn canonical_bytes(payload: &Value) -> Result<Vec<u8>, SigningError> {
        Ok(serde_json::to_vec(payload)?)
    }

    /// Sign a canonical payload, returning a URL-safe base64 signature.
    pub fn sign(&self, payload: &Value) -> Result<AuditSignature, SigningError> {
        let encoded = Self::canonical_bytes(payload)?;
        let tag = hmac::sign(&self.key, &encoded);
        Ok(AuditSignature {
            algorithm: DEFAULT_ALGORITHM.to_string(),
            signature: URL_SAFE.encode(tag.as_ref()),
        })
    }

    /// Recompute and compare in constant time. A signature that does not
    /// even decode as base64 is simply invalid, not an error.
    pub fn verify(&self, payload: &Value, signature: &str) -> Result<bool, SigningError> {
        let encoded = Self::canonical_bytes(payload)?;
        let Ok(decoded) = URL_SAFE.decode(signature) else {
            return Ok(false);
        };
        Ok(hmac::verify(&self.key, &encoded, &decoded).is_ok())
    }
}

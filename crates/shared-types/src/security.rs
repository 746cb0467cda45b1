//! # Envelope Authentication
//!
//! Every envelope crossing the channel carries a `sign` tag computed over its
//! canonical content.
//!
//! ## Canonical Content
//!
//! The envelope without its `sign` field, converted to a JSON value and
//! serialized compactly. Converting through `serde_json::Value` first makes
//! the bytes independent of how the payload type orders its fields, so the
//! sender (typed payload) and the receiver (`Value` payload) compute the same
//! content.
//!
//! ## Security Properties
//!
//! - **HMAC-SHA256 tags**, hex encoded on the wire
//! - **Constant-time verification** via `Mac::verify_slice`
//! - **Per-channel keys** derived from a master secret

use crate::envelope::{Cancel, Request, RequestId, Response};
use crate::result::Validation;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors from signer construction or envelope sealing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// An empty key would authenticate nothing.
    #[error("signing key is empty")]
    EmptyKey,

    /// The envelope content could not be serialized.
    #[error("cannot encode envelope content: {0}")]
    Encoding(String),
}

// =============================================================================
// SIGNER
// =============================================================================

/// Computes and checks authentication tags over raw content.
///
/// Implementations must be deterministic for the same content and key, and
/// `verify` must not have side effects.
pub trait Signer: Send + Sync {
    /// Compute the tag for `content`.
    fn sign(&self, content: &[u8]) -> String;

    /// Check `sign` against `content`.
    fn verify(&self, content: &[u8], sign: &str) -> bool;
}

/// HMAC-SHA256 signer with a shared secret.
#[derive(Clone)]
pub struct HmacSigner {
    mac: HmacSha256,
}

impl HmacSigner {
    /// Create a signer from a shared secret.
    pub fn new(secret: &[u8]) -> Result<Self, SignerError> {
        if secret.is_empty() {
            return Err(SignerError::EmptyKey);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| SignerError::EmptyKey)?;
        Ok(Self { mac })
    }

    /// Create a signer whose key is derived from `master_secret` for one
    /// channel, so that several channels never share a key.
    pub fn derived(master_secret: &[u8], channel_label: &str) -> Result<Self, SignerError> {
        if master_secret.is_empty() {
            return Err(SignerError::EmptyKey);
        }
        let mut mac =
            HmacSha256::new_from_slice(master_secret).map_err(|_| SignerError::EmptyKey)?;
        mac.update(channel_label.as_bytes());
        let key = mac.finalize().into_bytes();
        Self::new(&key)
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HmacSigner { .. }")
    }
}

impl Signer for HmacSigner {
    fn sign(&self, content: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(content);
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, content: &[u8], sign: &str) -> bool {
        let Ok(tag) = hex::decode(sign) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(content);
        mac.verify_slice(&tag).is_ok()
    }
}

// =============================================================================
// SIGNABLE ENVELOPES
// =============================================================================

/// An envelope with a `sign` field.
pub trait Signable {
    /// Canonical bytes of everything except `sign`.
    fn signing_content(&self) -> Result<Vec<u8>, SignerError>;

    /// The current tag.
    fn signature(&self) -> &str;

    /// Replace the tag.
    fn set_signature(&mut self, sign: String);
}

/// Envelope-level operations available on every [`Signer`].
pub trait EnvelopeSigner {
    /// Compute and store the envelope's tag.
    fn seal<E: Signable>(&self, envelope: &mut E) -> Result<(), SignerError>;

    /// Check the envelope's tag. Content that cannot be encoded never verifies.
    fn verify_envelope<E: Signable>(&self, envelope: &E) -> bool;
}

impl<S: Signer + ?Sized> EnvelopeSigner for S {
    fn seal<E: Signable>(&self, envelope: &mut E) -> Result<(), SignerError> {
        let content = envelope.signing_content()?;
        envelope.set_signature(self.sign(&content));
        Ok(())
    }

    fn verify_envelope<E: Signable>(&self, envelope: &E) -> bool {
        match envelope.signing_content() {
            Ok(content) => self.verify(&content, envelope.signature()),
            Err(_) => false,
        }
    }
}

fn canonical<V: Serialize>(view: &V) -> Result<Vec<u8>, SignerError> {
    let value = serde_json::to_value(view).map_err(|e| SignerError::Encoding(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| SignerError::Encoding(e.to_string()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestContent<'a, T> {
    method: &'a str,
    request_id: &'a RequestId,
    payload: &'a T,
}

impl<T: Serialize> Signable for Request<T> {
    fn signing_content(&self) -> Result<Vec<u8>, SignerError> {
        canonical(&RequestContent {
            method: &self.method,
            request_id: &self.request_id,
            payload: &self.payload,
        })
    }

    fn signature(&self) -> &str {
        &self.sign
    }

    fn set_signature(&mut self, sign: String) {
        self.sign = sign;
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseContent<'a, T> {
    request_id: &'a Option<RequestId>,
    success: bool,
    data: &'a Option<T>,
    validation: &'a Option<Validation>,
    error: &'a Option<String>,
    done: bool,
}

impl<T: Serialize> Signable for Response<T> {
    fn signing_content(&self) -> Result<Vec<u8>, SignerError> {
        canonical(&ResponseContent {
            request_id: &self.request_id,
            success: self.success,
            data: &self.data,
            validation: &self.validation,
            error: &self.error,
            done: self.done,
        })
    }

    fn signature(&self) -> &str {
        &self.sign
    }

    fn set_signature(&mut self, sign: String) {
        self.sign = sign;
    }
}

#[derive(Serialize)]
struct CancelContent<'a> {
    cancel: &'a RequestId,
}

impl Signable for Cancel {
    fn signing_content(&self) -> Result<Vec<u8>, SignerError> {
        canonical(&CancelContent {
            cancel: &self.cancel,
        })
    }

    fn signature(&self) -> &str {
        &self.sign
    }

    fn set_signature(&mut self, sign: String) {
        self.sign = sign;
    }
}

// =============================================================================
// TESTS
// =============================================================================

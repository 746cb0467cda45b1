//! # Wire Envelopes
//!
//! The message shapes exchanged between the caller context and the worker
//! context. These types ARE the wire format: field names are camelCase JSON
//! keys, one envelope per channel message.
//!
//! ## Shapes
//!
//! - [`Request`]: caller → worker. Selects a processor by `method`.
//! - [`Response`]: worker → caller. Correlated by `requestId`; `done == false`
//!   announces that more responses with the same id follow.
//! - [`Cancel`]: caller → worker. Asks the worker to stop producing for an
//!   abandoned `requestId`.
//!
//! Every envelope carries a `sign` field computed over the rest of its
//! content (see [`crate::security`]).

use crate::result::{CallResult, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// REQUEST ID
// =============================================================================

/// Identifier correlating a request with all of its responses.
///
/// Opaque on the wire (a JSON string). The issuing side guarantees that no two
/// live calls share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// REQUEST
// =============================================================================

/// A signed command issued by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<T = Value> {
    /// Name of the processor that should handle the payload.
    pub method: String,
    /// Correlation id, unique among the issuer's live calls.
    pub request_id: RequestId,
    /// Caller-supplied payload, opaque to the transport.
    pub payload: T,
    /// Authentication tag over `method`, `requestId` and `payload`.
    #[serde(default)]
    pub sign: String,
}

impl<T> Request<T> {
    /// Build an unsigned request. Call `Signer::seal` before sending.
    pub fn new(method: impl Into<String>, request_id: RequestId, payload: T) -> Self {
        Self {
            method: method.into(),
            request_id,
            payload,
            sign: String::new(),
        }
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// One part of the answer to a [`Request`].
///
/// Invariant: `success == false` implies `data` is `None` and at least one of
/// `validation` or `error` is populated. A response with `done == true` is the
/// last one for its `request_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T = Value> {
    /// Correlation id of the originating request. Absent only when the
    /// request could not be parsed far enough to recover it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    /// Whether the processor produced this part without failing.
    pub success: bool,
    /// The produced data; serialized as `null` when absent.
    pub data: Option<T>,
    /// Field → message mapping for semantically invalid payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    /// Human-readable failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Authentication tag over every other field.
    #[serde(default)]
    pub sign: String,
    /// `false` while more parts for this `request_id` will follow.
    pub done: bool,
}

impl<T> Response<T> {
    /// A successful part carrying a processor result.
    ///
    /// When the result carries validation messages its data is discarded so
    /// that the two outcomes never travel together.
    pub fn part(request_id: RequestId, result: CallResult<T>, done: bool) -> Self {
        let (data, validation) = match result.validation {
            Some(validation) => (None, Some(validation)),
            None => (result.data, None),
        };
        Self {
            request_id: Some(request_id),
            success: true,
            data,
            validation,
            error: None,
            sign: String::new(),
            done,
        }
    }

    /// A terminal failure. Always `done == true`.
    pub fn failure(request_id: Option<RequestId>, error: impl Into<String>) -> Self {
        Self {
            request_id,
            success: false,
            data: None,
            validation: None,
            error: Some(error.into()),
            sign: String::new(),
            done: true,
        }
    }

    /// A terminal rejection carrying only validation messages.
    pub fn rejected(request_id: RequestId, validation: Validation) -> Self {
        Self {
            request_id: Some(request_id),
            success: false,
            data: None,
            validation: Some(validation),
            error: None,
            sign: String::new(),
            done: true,
        }
    }

    /// Whether this is the last response for its request.
    ///
    /// A failed response ends the chain even if a faulty peer left `done`
    /// unset.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.done || !self.success
    }

    /// Check the success/failure invariant.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        if self.success {
            return true;
        }
        self.data.is_none() && (self.validation.is_some() || self.error.is_some())
    }
}

// =============================================================================
// CANCEL
// =============================================================================

/// Caller → worker notice that a call was abandoned.
///
/// The worker stops the processor chain for `cancel` and emits nothing more
/// for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancel {
    /// The abandoned request id.
    pub cancel: RequestId,
    /// Authentication tag over `cancel`.
    #[serde(default)]
    pub sign: String,
}

impl Cancel {
    /// Build an unsigned cancel notice.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            cancel: request_id,
            sign: String::new(),
        }
    }
}

/// Any envelope the worker side can receive.
///
/// Distinguished structurally: a request has `method`, a cancel has `cancel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallerMessage {
    /// A new call.
    Request(Request),
    /// An abandoned call.
    Cancel(Cancel),
}

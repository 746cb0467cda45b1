//! # Error Types
//!
//! Errors that cross the context boundary. Their `Display` output is what
//! travels in a response's `error` field.

use thiserror::Error;

/// Terminal rejections decided by the router before or instead of running a
/// processor. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// No processor is registered under the requested method.
    #[error("unknown method")]
    UnknownMethod,

    /// The envelope's `sign` did not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// The inbound message is not a request or cancel envelope.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// A call with this id is already running.
    #[error("duplicate request id")]
    DuplicateRequestId,
}

/// Failure raised by a processor while producing results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// The processor could not complete (e.g. its data source is unreachable).
    #[error("{0}")]
    Failed(String),

    /// The payload does not have the shape the method expects.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The processor panicked.
    #[error("processor panicked")]
    Panicked,
}

impl ProcessorError {
    /// Shorthand for [`ProcessorError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<serde_json::Error> for ProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Failed(format!("serialization error: {}", err))
    }
}

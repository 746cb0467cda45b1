//! Caller-facing error types.

use crate::domain::config::ConfigError;
use shared_bus::ChannelError;
use shared_types::RequestId;
use thiserror::Error;

/// Why a dispatched call did not produce a result.
///
/// Every dispatched call ends in either a final part or exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The worker reported a failure (`success == false` with `error`).
    #[error("remote failure: {message}")]
    Remote { message: String },

    /// No response arrived within the call's timeout.
    #[error("call timed out")]
    Timeout,

    /// The call was cancelled, or its entry released without a result.
    #[error("call cancelled")]
    Cancelled,

    /// The request could not be handed to the channel.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A response for this call failed signature verification.
    #[error("response signature did not verify")]
    InvalidSignature,

    /// The response data does not have the expected shape.
    #[error("cannot decode response data: {0}")]
    Decode(String),

    /// The request could not be serialized or signed.
    #[error("cannot encode request: {0}")]
    Encode(String),

    /// A failed response carried neither `error` nor `validation`.
    #[error("malformed response: failure without error or validation")]
    MalformedResponse,

    /// The dispatcher shut down while the call was pending.
    #[error("dispatcher shut down")]
    Shutdown,

    /// The generated id collided with a live call.
    #[error("duplicate request id: {0}")]
    DuplicateRequestId(RequestId),
}

impl CallError {
    /// Whether the failure was reported by the worker rather than detected
    /// locally.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl From<ChannelError> for CallError {
    fn from(err: ChannelError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Errors starting a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatcherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The channel's inbound subscription is unavailable.
    #[error("cannot subscribe to channel: {0}")]
    Channel(#[from] ChannelError),
}

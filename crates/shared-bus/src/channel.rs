//! # Channel Adapter Contract
//!
//! The message-passing primitive both contexts communicate through:
//! fire-and-forget `send`, one inbound [`Subscription`]. Reliable and ordered
//! between the two peers, otherwise opaque. The transport does not pair
//! requests with responses.

use crate::subscriber::Subscription;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from channel operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The peer is gone or the inbound side was torn down.
    #[error("channel closed")]
    Closed,

    /// The adapter's single subscription has already been taken.
    #[error("channel already has a subscriber")]
    AlreadySubscribed,

    /// The underlying stream failed.
    #[error("channel I/O error: {0}")]
    Io(String),

    /// The message cannot be framed for this transport.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// A bidirectional message channel to exactly one peer.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Deliver one message to the peer.
    ///
    /// Returns once the message is handed to the transport; delivery is not
    /// acknowledged.
    async fn send(&self, message: String) -> Result<(), ChannelError>;

    /// Take the adapter's inbound subscription.
    ///
    /// # Errors
    ///
    /// `ChannelError::AlreadySubscribed` on every call after the first.
    fn subscribe(&self) -> Result<Subscription, ChannelError>;

    /// Total messages handed to the transport.
    fn messages_sent(&self) -> u64;
}

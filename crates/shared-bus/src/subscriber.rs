//! # Inbound Subscription
//!
//! The receiving side of a channel adapter. Each adapter hands out exactly one
//! subscription; dropping or closing it tears the inbound path down and makes
//! the peer's sends fail with `ChannelError::Closed`.

use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// The single inbound message stream of a channel adapter.
pub struct Subscription {
    /// Messages delivered by the adapter, in arrival order.
    receiver: mpsc::UnboundedReceiver<String>,

    /// Adapter label, for logs.
    label: String,
}

impl Subscription {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        debug!(channel = %label, "Subscription created");
        Self { receiver, label }
    }

    /// Receive the next message.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next inbound message
    /// - `None` - The peer (or the underlying stream) is gone
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Receive without waiting. `None` when nothing is buffered.
    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }

    /// Stop receiving. Messages already buffered are discarded.
    pub fn close(mut self) {
        self.receiver.close();
    }

    /// Label of the adapter this subscription belongs to.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(channel = %self.label, "Subscription dropped");
    }
}

impl Stream for Subscription {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

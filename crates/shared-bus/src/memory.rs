//! # In-Memory Channel
//!
//! Two connected adapters living in the same process. Stands in for the
//! browser's worker message port in tests and embedded setups.

use crate::channel::{ChannelError, MessageChannel};
use crate::subscriber::Subscription;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One end of an in-memory channel pair.
///
/// Uses unbounded `tokio::sync::mpsc` queues in both directions, so `send`
/// never waits.
pub struct InMemoryChannel {
    /// Queue feeding the peer's subscription.
    outbound: mpsc::UnboundedSender<String>,

    /// Our inbound queue, taken by the first `subscribe()`.
    inbound: Mutex<Option<mpsc::UnboundedReceiver<String>>>,

    /// Total messages sent.
    messages_sent: AtomicU64,

    label: String,
}

impl InMemoryChannel {
    /// Create two connected ends, labelled `"caller"` and `"worker"`.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        Self::labelled_pair("caller", "worker")
    }

    /// Create two connected ends with custom labels.
    #[must_use]
    pub fn labelled_pair(left: &str, right: &str) -> (Self, Self) {
        let (to_right, right_inbound) = mpsc::unbounded_channel();
        let (to_left, left_inbound) = mpsc::unbounded_channel();

        let left = Self {
            outbound: to_right,
            inbound: Mutex::new(Some(left_inbound)),
            messages_sent: AtomicU64::new(0),
            label: left.to_string(),
        };
        let right = Self {
            outbound: to_left,
            inbound: Mutex::new(Some(right_inbound)),
            messages_sent: AtomicU64::new(0),
            label: right.to_string(),
        };
        (left, right)
    }

    /// Adapter label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the peer can still receive.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.outbound.is_closed()
    }
}

#[async_trait]
impl MessageChannel for InMemoryChannel {
    async fn send(&self, message: String) -> Result<(), ChannelError> {
        match self.outbound.send(message) {
            Ok(()) => {
                self.messages_sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(_) => {
                warn!(channel = %self.label, "Send failed: peer is gone");
                Err(ChannelError::Closed)
            }
        }
    }

    fn subscribe(&self) -> Result<Subscription, ChannelError> {
        let receiver = self
            .inbound
            .lock()
            .take()
            .ok_or(ChannelError::AlreadySubscribed)?;
        debug!(channel = %self.label, "Inbound subscription taken");
        Ok(Subscription::new(receiver, self.label.clone()))
    }

    fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }
}

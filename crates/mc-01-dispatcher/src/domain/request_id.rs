//! Request id generation.
//!
//! Ids are `<session>-<counter>`: a random per-dispatcher prefix followed by a
//! monotonically increasing counter. Two dispatchers sharing a worker never
//! collide, and one dispatcher never reuses an id.

use shared_types::RequestId;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Issues fresh request ids for one dispatcher.
#[derive(Debug)]
pub struct RequestIdGenerator {
    session: String,
    counter: AtomicU64,
}

impl RequestIdGenerator {
    /// Create a generator with a random session prefix.
    pub fn new() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self::with_session(&uuid[..8])
    }

    /// Create a generator with a fixed session prefix.
    pub fn with_session(session: &str) -> Self {
        Self {
            session: session.to_string(),
            counter: AtomicU64::new(0),
        }
    }

    /// The next id.
    pub fn next_id(&self) -> RequestId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        RequestId::new(format!("{}-{}", self.session, n))
    }

    /// Session prefix shared by every id of this generator.
    pub fn session(&self) -> &str {
        &self.session
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

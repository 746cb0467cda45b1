//! # Shared Bus - Channel Adapters for Inter-Context Messaging
//!
//! The transport underneath the dispatcher and the router. A channel moves
//! opaque string messages between exactly two peers.
//!
//! ## Contract
//!
//! - `send(message)`: fire-and-forget, ordered, single peer
//! - `subscribe()`: exactly one inbound [`Subscription`] per adapter, torn
//!   down by `close()` or drop
//! - No request/response pairing: correlation lives above this layer
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │    Caller    │      send()        │    Worker    │
//! │  Dispatcher  │ ─────────────────► │    Router    │
//! │              │ ◄───────────────── │              │
//! └──────────────┘    Subscription    └──────────────┘
//! ```
//!
//! ## Implementations
//!
//! - [`InMemoryChannel`]: connected pair inside one process
//! - [`LineChannel`]: newline-delimited messages over a byte stream pair

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod channel;
pub mod line;
pub mod memory;
pub mod subscriber;

// Re-export main types
pub use channel::{ChannelError, MessageChannel};
pub use line::LineChannel;
pub use memory::InMemoryChannel;
pub use subscriber::Subscription;

// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! MC-01 Request Dispatcher - caller side of the inter-context messaging layer.
//!
//! Issues typed, signed requests over a message channel and resolves them
//! from correlated responses, including multi-part continuation chains.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     DISPATCHER (mc-01)                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │   dispatch::<M>(payload)                                      │
//! │         │  sign + register + send                             │
//! │  ┌──────┴──────────────────────────────┐                      │
//! │  │          Correlation Table          │ ◄── sweeper          │
//! │  │   requestId → oneshot sender/stage  │     (timeouts)       │
//! │  └──────┬──────────────────────────────┘                      │
//! │         │  deliver()                                          │
//! │  ┌──────┴──────────────────────────────┐                      │
//! │  │          Response Listener          │                      │
//! │  │     parse → verify → correlate      │                      │
//! │  └──────┬──────────────────────────────┘                      │
//! └─────────┼────────────────────────────────────────────────────┘
//!           │
//!     Message Channel (shared-bus)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use mc_01_dispatcher::{Dispatcher, DispatcherConfig};
//! use shared_types::{ListOrders, OrderQuery};
//!
//! let dispatcher = Dispatcher::start(channel, signer, DispatcherConfig::default())?;
//! let first = dispatcher.dispatch::<ListOrders>(query).await?;
//! let pages = first.drain().await?;
//! ```
//!
//! # Guarantees
//!
//! - At most one live entry per request id
//! - Parts of one call arrive in emission order
//! - Every call ends in a final part or a `CallError`
//! - Abandoned, timed-out and cancelled calls send a signed `Cancel`

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod call;
pub mod dispatcher;
pub mod domain;
mod listener;

pub use call::{Continuation, Part};
pub use dispatcher::Dispatcher;
pub use domain::{
    CallError, ConfigError, CorrelationTable, DeliveryOutcome, DispatcherConfig, DispatcherError,
    PendingStats, RequestIdGenerator, Stage,
};

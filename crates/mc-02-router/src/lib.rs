// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! MC-02 Response Router - worker side of the inter-context messaging layer.
//!
//! Receives signed requests from the channel, runs the registered processor
//! for the method and sends back one signed response per produced result.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ROUTER (mc-02)                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  receive loop: parse → verify → lookup → spawn chain          │
//! │         │                                                     │
//! │  ┌──────┴──────────────────────────────┐                      │
//! │  │        Processor Registry           │                      │
//! │  │     method → Arc<dyn Processor>     │                      │
//! │  └──────┬──────────────────────────────┘                      │
//! │         │  Produced { result, continuation }                  │
//! │  ┌──────┴──────────────────────────────┐                      │
//! │  │   Chain task (one per request id)   │ ◄── cancel trigger   │
//! │  │   emit part → await next → emit     │                      │
//! │  └──────┬──────────────────────────────┘                      │
//! └─────────┼────────────────────────────────────────────────────┘
//!           │
//!     Message Channel (shared-bus)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use mc_02_router::{ProcessorRegistry, ResponseRouter};
//! use shared_types::ListOrders;
//!
//! let mut registry = ProcessorRegistry::new();
//! registry.register_method::<ListOrders, _>(OrdersProcessor::new(catalog))?;
//! let router = ResponseRouter::install(registry, channel, signer)?;
//! router.closed().await;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod processor;
pub mod registry;
pub mod router;

pub use processor::{Handler, NextStep, Processor, Produced, Typed};
pub use registry::{ProcessorRegistry, RegistryError};
pub use router::{ResponseRouter, RouterError, RouterStats};

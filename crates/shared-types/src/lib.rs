//! # Shared Types Crate
//!
//! Wire envelopes, result types, method descriptors and the signer shared by
//! the caller context and the worker context.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: both sides of the channel compile against
//!   these definitions, so the wire format cannot drift.
//! - **Envelope Integrity**: every `Request`, `Response` and `Cancel` carries
//!   a `sign` tag over its canonical content.
//! - **Typed Methods**: a `Method` names a processor and fixes its payload and
//!   output types.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;
pub mod method;
pub mod result;
pub mod security;

pub use entities::*;
pub use envelope::{CallerMessage, Cancel, Request, RequestId, Response};
pub use errors::*;
pub use ipc::*;
pub use method::Method;
pub use result::{CallResult, Validation};
pub use security::*;

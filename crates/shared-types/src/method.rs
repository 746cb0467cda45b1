//! # Method Descriptors
//!
//! A [`Method`] binds a wire method name to its payload and output types.
//! Callers dispatch by type, processors register by type, and both sides
//! agree on the shapes without sharing anything but this crate.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Compile-time descriptor of one remote method.
pub trait Method: Send + Sync + 'static {
    /// Wire name carried in `Request::method`.
    const NAME: &'static str;

    /// Request payload.
    type Payload: Serialize + DeserializeOwned + Send + 'static;

    /// Data carried by each successful response part.
    type Output: Serialize + DeserializeOwned + Send + 'static;
}

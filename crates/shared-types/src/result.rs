//! # Call Results
//!
//! The caller-facing outcome of one part of a call. A result carries either
//! data or validation messages, never both.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field name → human-readable message.
///
/// A `BTreeMap` so that the serialized form (and therefore the envelope
/// signature) does not depend on insertion order.
pub type Validation = BTreeMap<String, String>;

/// One resolved part of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult<T = Value> {
    /// The produced data, absent when the payload failed validation.
    pub data: Option<T>,
    /// Validation messages, present only when the payload was rejected.
    pub validation: Option<Validation>,
}

impl<T> CallResult<T> {
    /// A result carrying data.
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            validation: None,
        }
    }

    /// A result with neither data nor validation (e.g. an acknowledgement).
    pub fn empty() -> Self {
        Self {
            data: None,
            validation: None,
        }
    }

    /// A result rejecting the payload.
    pub fn invalid(validation: Validation) -> Self {
        Self {
            data: None,
            validation: Some(validation),
        }
    }

    /// A result rejecting a single field.
    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut validation = Validation::new();
        validation.insert(field.into(), message.into());
        Self::invalid(validation)
    }

    /// Whether the payload was rejected. Check this before looking at `data`.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.validation.is_some()
    }

    /// Take the data out of the result.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Transform the data, keeping validation untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallResult<U> {
        CallResult {
            data: self.data.map(f),
            validation: self.validation,
        }
    }
}

impl CallResult<Value> {
    /// Decode the JSON data into a concrete type.
    ///
    /// A `null` data value decodes as "no data".
    pub fn decode<T: DeserializeOwned>(self) -> Result<CallResult<T>, serde_json::Error> {
        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value)?),
        };
        Ok(CallResult {
            data,
            validation: self.validation,
        })
    }
}

impl<T: Serialize> CallResult<T> {
    /// Encode the data into JSON for the wire.
    pub fn encode(self) -> Result<CallResult<Value>, serde_json::Error> {
        let data = match self.data {
            None => None,
            Some(data) => Some(serde_json::to_value(data)?),
        };
        Ok(CallResult {
            data,
            validation: self.validation,
        })
    }
}

//! Cross-crate integration suites.

pub mod harness;

mod continuation;
mod failures;
mod isolation;
mod line_transport;
mod marketplace;
mod security;

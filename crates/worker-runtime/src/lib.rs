//! # Worker Runtime Library
//!
//! The background execution context: marketplace processors served by an
//! `mc-02-router` over a message channel. The `mercato-worker` binary runs it
//! on stdin/stdout.

#![allow(missing_docs)]
#![allow(clippy::type_complexity)]

pub mod config;
pub mod processors;
pub mod runtime;

pub use config::{load_config, load_config_from, ConfigError, WorkerConfig};
pub use processors::{build_registry, Catalog};
pub use runtime::{RuntimeError, WorkerRuntime};

//! Domain types for the dispatcher.
//!
//! Configuration, errors, id generation and the correlation table.

pub mod config;
pub mod error;
pub mod pending;
pub mod request_id;

// Re-exports for convenience
pub use config::{ConfigError, DispatcherConfig};
pub use error::{CallError, DispatcherError};
pub use pending::{CorrelationTable, DeliveryOutcome, PendingStats, Stage};
pub use request_id::RequestIdGenerator;

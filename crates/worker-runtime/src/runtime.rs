//! # Worker Runtime
//!
//! Wires configuration, catalog, signer and router onto one channel.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Derive the channel signing key
//! 3. Register the marketplace processors
//! 4. Install the router on the channel

use crate::config::{ConfigError, WorkerConfig};
use crate::processors::{build_registry, Catalog};
use mc_02_router::{RegistryError, ResponseRouter, RouterError, RouterStats};
use shared_bus::MessageChannel;
use shared_types::SignerError;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors starting the worker.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot derive channel key: {0}")]
    Signer(#[from] SignerError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Router(#[from] RouterError),
}

/// A running worker serving one channel.
pub struct WorkerRuntime {
    router: ResponseRouter,
    catalog: Arc<Catalog>,
}

impl WorkerRuntime {
    /// Start serving `catalog` on `channel`.
    pub fn start(
        config: &WorkerConfig,
        catalog: Arc<Catalog>,
        channel: Arc<dyn MessageChannel>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;

        let signer = config.security.signer()?;
        let registry = build_registry(Arc::clone(&catalog), config.catalog.page_size)?;
        let router = ResponseRouter::install(registry, channel, Arc::new(signer))?;

        info!(
            channel_label = %config.security.channel_label,
            page_size = config.catalog.page_size,
            "Worker runtime started"
        );

        Ok(Self { router, catalog })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn stats(&self) -> &RouterStats {
        self.router.stats()
    }

    /// Wait until the channel closes or the runtime is shut down.
    pub async fn closed(&self) {
        self.router.closed().await;
    }

    /// Stop serving; running chains are cancelled.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.router.shutdown().await;
        info!("Shutdown complete");
    }
}

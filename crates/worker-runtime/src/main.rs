//! # Mercato Worker
//!
//! Serves the marketplace methods to a parent process.
//!
//! ## Channel
//!
//! - stdin: newline-delimited request and cancel envelopes
//! - stdout: newline-delimited response envelopes
//! - stderr: logs
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry
//! 2. Load configuration from the environment
//! 3. Validate the HMAC secret is not default
//! 4. Start the runtime on stdio
//! 5. Run until the parent closes stdin or Ctrl+C

use std::sync::Arc;

use anyhow::{Context, Result};
use mercato_telemetry::{init_telemetry, TelemetryConfig};
use shared_bus::LineChannel;
use tracing::info;
use worker_runtime::{load_config, Catalog, WorkerRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::for_service("worker"))
        .context("Failed to initialize telemetry")?;

    let config = load_config().context("Failed to load configuration")?;
    config
        .validate_for_production()
        .context("Refusing to start with insecure configuration")?;

    let channel = Arc::new(LineChannel::stdio());
    let runtime = WorkerRuntime::start(&config, Arc::new(Catalog::seeded()), channel)
        .context("Failed to start worker runtime")?;

    info!("Worker is running. Close stdin or press Ctrl+C to stop.");
    tokio::select! {
        _ = runtime.closed() => info!("Parent closed the channel"),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Ctrl+C received");
        }
    }

    runtime.shutdown().await;
    Ok(())
}

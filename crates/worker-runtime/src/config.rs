//! # Worker Configuration
//!
//! Runtime parameters for the worker process.
//!
//! ## Security Requirements
//!
//! - `hmac_secret` MUST NOT be the default zero value in production
//! - Both ends of a channel derive their key from the same secret and label

use shared_types::{HmacSigner, SignerError};
use thiserror::Error;
use tracing::info;

/// Default listing page size.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default label mixed into the per-channel signing key.
pub const DEFAULT_CHANNEL_LABEL: &str = "mercato/worker";

/// Complete worker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Security configuration.
    pub security: SecurityConfig,
    /// Catalog configuration.
    pub catalog: CatalogConfig,
}

impl WorkerConfig {
    /// Structural checks that apply in every environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.channel_label.trim().is_empty() {
            return Err(ConfigError::EmptyChannelLabel);
        }
        if self.catalog.page_size == 0 {
            return Err(ConfigError::InvalidPageSize("must be at least 1".into()));
        }
        Ok(())
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - HMAC secret is the default zero value
    /// - any structural check fails
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.security.hmac_secret == [0u8; 32] {
            return Err(ConfigError::InsecureHmacSecret);
        }
        self.validate()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// HMAC secret is not set (zero value).
    #[error(
        "SECURITY VIOLATION: HMAC secret is default zero value. \
         Set MC_HMAC_SECRET environment variable or provide in config."
    )]
    InsecureHmacSecret,

    #[error("MC_HMAC_SECRET must be 32 bytes (64 hex chars): {0}")]
    InvalidHmacSecret(String),

    #[error("channel label must not be empty")]
    EmptyChannelLabel,

    #[error("invalid page size: {0}")]
    InvalidPageSize(String),
}

/// Security configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Master HMAC secret (32 bytes).
    /// MUST NOT be default in production.
    pub hmac_secret: [u8; 32],
    /// Label the channel key is derived under.
    pub channel_label: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hmac_secret: [0u8; 32], // MUST be overridden in production
            channel_label: DEFAULT_CHANNEL_LABEL.to_string(),
        }
    }
}

impl SecurityConfig {
    /// Signer keyed for this channel.
    pub fn signer(&self) -> Result<HmacSigner, SignerError> {
        HmacSigner::derived(&self.hmac_secret, &self.channel_label)
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Items per listing page.
    pub page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<WorkerConfig, ConfigError> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary variable lookup.
///
/// - `MC_HMAC_SECRET`: master secret, 64 hex chars
/// - `MC_CHANNEL_LABEL`: key derivation label
/// - `MC_PAGE_SIZE`: listing page size
pub fn load_config_from<F>(lookup: F) -> Result<WorkerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = WorkerConfig::default();

    if let Some(secret_hex) = lookup("MC_HMAC_SECRET") {
        let secret_bytes = hex::decode(secret_hex.trim())
            .map_err(|e| ConfigError::InvalidHmacSecret(e.to_string()))?;
        if secret_bytes.len() != 32 {
            return Err(ConfigError::InvalidHmacSecret(format!(
                "got {} bytes",
                secret_bytes.len()
            )));
        }
        config.security.hmac_secret.copy_from_slice(&secret_bytes);
        info!("Loaded HMAC secret from environment");
    }

    if let Some(label) = lookup("MC_CHANNEL_LABEL") {
        config.security.channel_label = label;
    }

    if let Some(size) = lookup("MC_PAGE_SIZE") {
        config.catalog.page_size = size
            .parse()
            .map_err(|_| ConfigError::InvalidPageSize(size.clone()))?;
    }

    config.validate()?;
    Ok(config)
}

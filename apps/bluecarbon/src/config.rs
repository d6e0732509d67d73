//! # Server Configuration
//!
//! TOML-file configuration for the server command, with environment
//! variables taking precedence for the security-sensitive settings
//! (`BLUECARBON_CORS_ORIGINS`, `BLUECARBON_RATE_LIMIT`,
//! `BLUECARBON_API_KEY` are read where they are used, not here).
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 8080
//! gateway_delay_ms = 2000
//! seed_demo = true
//! ```

use bluecarbon_core::MarketError;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// SERVER CONFIG
// =============================================================================

/// Server settings loaded from a TOML file or defaulted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Artificial per-call gateway delay in milliseconds, standing in
    /// for storage/ledger latency. 0 disables the delay.
    pub gateway_delay_ms: u64,
    /// Start from the demo dataset instead of an empty registry.
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            gateway_delay_ms: 2000,
            seed_demo: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, MarketError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MarketError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            MarketError::SerializationError(format!(
                "Invalid config '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// The bind address string.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================

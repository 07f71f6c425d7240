//! Tracing support
//!
//! Structured logging configuration over the tracing ecosystem. The
//! library itself only emits `tracing` events; installing a subscriber is
//! the host application's call, and these helpers cover the common case.
//! With no subscriber installed (tests, embedders with their own setup)
//! every event is a no-op.

use std::env;

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Fallback log level when RUST_LOG is unset
    pub log_level: Level,
    /// Emit JSON-formatted events
    pub json_logs: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            json_logs: false,
        }
    }
}

impl TracingConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let log_level = env::var("RUST_LOG")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Level::INFO);

        let json_logs = env::var("JSON_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            log_level,
            json_logs,
        }
    }
}

/// Install a global subscriber for the given config.
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if config.json_logs {
        fmt().with_env_filter(filter).json().try_init()?;
    } else {
        fmt().with_env_filter(filter).try_init()?;
    }
    Ok(())
}

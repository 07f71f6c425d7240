//! Configuration module for plangate
//!
//! This module handles loading and validating configuration from
//! environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::backend::{ApiBackend, BackendOptions, DEFAULT_API_BASE};

/// Main library settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Project whose feature matrix and usage records are addressed
    pub project_id: String,
    /// Which backend variant to construct
    pub backend: BackendKind,
    pub api: ApiSettings,
    pub timeouts: TimeoutSettings,
}

/// Backend variant selector
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Run the gating logic locally against an object store
    #[default]
    Object,
    /// Delegate every operation to the remote gating service
    Api,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "object" => Ok(BackendKind::Object),
            "api" => Ok(BackendKind::Api),
            other => anyhow::bail!("Unknown backend kind: {other}"),
        }
    }
}

/// Remote gating service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Service base URL
    pub base_url: String,
    /// API token sent as the Authorization header
    pub token: String,
}

/// Deadlines and retry limits
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutSettings {
    /// Deadline for each store call in seconds
    pub store_timeout_secs: u64,
    /// Deadline for each webhook delivery in seconds
    pub notifier_timeout_secs: u64,
    /// Read-modify-write retries before surfacing a conflict
    pub max_write_retries: u32,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self> {
        let backend: BackendKind = env::var("PLANGATE_BACKEND")
            .unwrap_or_else(|_| "object".to_string())
            .parse()
            .context("Invalid PLANGATE_BACKEND")?;

        let token = env::var("PLANGATE_API_TOKEN").unwrap_or_default();
        if backend == BackendKind::Api && token.is_empty() {
            anyhow::bail!("PLANGATE_API_TOKEN must be set for the api backend");
        }

        Ok(Settings {
            project_id: env::var("PLANGATE_PROJECT_ID")
                .map_err(|_| anyhow::anyhow!("PLANGATE_PROJECT_ID environment variable must be set"))?,
            backend,
            api: ApiSettings {
                base_url: env::var("PLANGATE_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
                token,
            },
            timeouts: TimeoutSettings {
                store_timeout_secs: env::var("PLANGATE_STORE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("Invalid PLANGATE_STORE_TIMEOUT_SECS")?,
                notifier_timeout_secs: env::var("PLANGATE_NOTIFIER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid PLANGATE_NOTIFIER_TIMEOUT_SECS")?,
                max_write_retries: env::var("PLANGATE_MAX_WRITE_RETRIES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .context("Invalid PLANGATE_MAX_WRITE_RETRIES")?,
            },
        })
    }

    /// Backend tuning derived from the timeout settings
    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            store_timeout: Duration::from_secs(self.timeouts.store_timeout_secs),
            notifier_timeout: Duration::from_secs(self.timeouts.notifier_timeout_secs),
            max_write_retries: self.timeouts.max_write_retries,
        }
    }

    /// Construct the remote backend these settings describe
    pub fn api_backend(&self) -> ApiBackend {
        ApiBackend::with_timeout(
            &self.project_id,
            &self.api.base_url,
            &self.api.token,
            Duration::from_secs(self.timeouts.store_timeout_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("object".parse::<BackendKind>().unwrap(), BackendKind::Object);
        assert_eq!("API".parse::<BackendKind>().unwrap(), BackendKind::Api);
        assert!("s3".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_backend_options_conversion() {
        let settings = Settings {
            project_id: "proj".to_string(),
            backend: BackendKind::Object,
            api: ApiSettings {
                base_url: DEFAULT_API_BASE.to_string(),
                token: String::new(),
            },
            timeouts: TimeoutSettings {
                store_timeout_secs: 5,
                notifier_timeout_secs: 15,
                max_write_retries: 2,
            },
        };
        let options = settings.backend_options();
        assert_eq!(options.store_timeout, Duration::from_secs(5));
        assert_eq!(options.notifier_timeout, Duration::from_secs(15));
        assert_eq!(options.max_write_retries, 2);
    }
}

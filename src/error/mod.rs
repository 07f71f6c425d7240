//! Error handling module for plangate
//!
//! This module defines the error types and conversion implementations
//! for consistent error handling across the library.

use thiserror::Error;

/// Library-wide error type
#[derive(Error, Debug)]
pub enum Error {
    /// Feature matrix (or the bucket/endpoint holding it) is missing.
    /// The decision engine never surfaces this: gating fails closed instead.
    #[error("Configuration not found: {0}")]
    ConfigNotFound(String),

    /// Persisted JSON could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Decoded configuration failed structural validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Network or storage failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Store call exceeded its deadline
    #[error("Store operation timed out after {0:?}")]
    StoreTimeout(std::time::Duration),

    /// Notifier call exceeded its deadline
    #[error("Notifier operation timed out after {0:?}")]
    NotifierTimeout(std::time::Duration),

    /// Conditional write lost to a concurrent writer and retries ran out
    #[error("Write conflict on {0}")]
    Conflict(String),

    /// Webhook POST failed. Consumed by the trigger, logged, never propagated.
    #[error("Webhook delivery failed: {0}")]
    Delivery(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err: Error = err.into();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.to_string().starts_with("Decode error"));
    }

    #[test]
    fn test_conflict_display_names_key() {
        let err = Error::Conflict("proj/users/u1.json".to_string());
        assert_eq!(err.to_string(), "Write conflict on proj/users/u1.json");
    }
}

//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("AI timeout must be between 1 and 60 seconds")]
    InvalidAiTimeout,

    #[error("Session TTL must be positive")]
    InvalidSessionTtl,

    #[error("Flow max age must be positive")]
    InvalidFlowMaxAge,

    #[error("Business phone must be set")]
    MissingBusinessPhone,
}

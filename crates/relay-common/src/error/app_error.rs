//! Application error types
//!
//! Process-level errors: startup, wiring and infrastructure that is not tied
//! to a single webhook event.

use relay_core::DomainError;
use std::fmt;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Error code for logs and job reports
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::InvalidJob(_) => "INVALID_JOB",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Whether running the same work again could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(_) | Self::Cache(_) | Self::ExternalService(_) => true,
            Self::Domain(e) => e.is_retryable(),
            Self::Config(_) | Self::InvalidJob(_) | Self::Internal(_) => false,
        }
    }

    #[must_use]
    pub fn invalid_job(msg: impl fmt::Display) -> Self {
        Self::InvalidJob(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

//! Ingestion error types
//!
//! Almost everything that can go wrong with one webhook event is a drop,
//! reported in the [`IngestReport`](crate::dto::IngestReport). Only failures
//! the dispatcher could fix by retrying the job surface here.

use relay_common::AppError;
use relay_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Durable store or dedup guard failed
    #[error(transparent)]
    Store(#[from] DomainError),

    /// Wiring or job input is unusable
    #[error("Validation error: {0}")]
    Validation(String),
}

impl IngestError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Whether the dispatcher should run the job again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Validation(_) => false,
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Store(e) => AppError::Domain(e),
            IngestError::Validation(msg) => AppError::InvalidJob(msg),
        }
    }
}

/// Result type for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

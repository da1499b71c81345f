// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Errors raised before a job exists (`Validation`) are synchronous and
/// caller-visible. Errors raised during async processing (`Extraction`,
/// `Recognition`, `Blob`) are captured into job state by the orchestrator
/// and observable only via status polling or the completion callback.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] crate::port::ExtractionError),

    #[error("Recognition error: {0}")]
    Recognition(#[from] crate::port::RecognitionError),

    #[error("Blob store error: {0}")]
    Blob(#[from] crate::port::BlobError),

    #[error("Callback delivery error: {0}")]
    Callback(#[from] crate::port::CallbackError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in the infra-sqlite crate
// by converting to AppError::Storage(String)

// Central Error Type for the Bridge

use crate::domain::DomainError;
use crate::port::TaskQueueError;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid queue name: {0}")]
    InvalidQueueName(String),

    #[error("Invalid idempotency key: {0}")]
    InvalidIdempotencyKey(String),

    /// Lookup/create of a physical queue failed (other than not-found)
    #[error("Failed to provision queue {queue}: {source}")]
    ResourceProvision {
        queue: String,
        source: TaskQueueError,
    },

    /// Task submission to the external service failed
    #[error("Failed to dispatch to {queue}: {source}")]
    Dispatch {
        queue: String,
        source: TaskQueueError,
    },

    #[error("Malformed delivery payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Execution engine error: {0}")]
    Engine(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidQueueName(name) => AppError::InvalidQueueName(name),
            DomainError::InvalidIdempotencyKey(msg) => AppError::InvalidIdempotencyKey(msg),
            DomainError::MalformedPayload(msg) => AppError::MalformedPayload(msg),
            DomainError::InvalidMessage(msg) => AppError::InvalidMessage(msg),
            DomainError::ValidationError(msg) => AppError::Validation(msg),
        }
    }
}

impl AppError {
    /// Errors caused by the request itself; redelivering the same input cannot succeed
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidQueueName(_)
                | AppError::InvalidIdempotencyKey(_)
                | AppError::MalformedPayload(_)
                | AppError::InvalidMessage(_)
                | AppError::Validation(_)
                | AppError::Serialization(_)
        )
    }
}

// Note: sqlx::Error and reqwest::Error conversions live in the infra crates
// (orphan rules), mapped to AppError::Database / TaskQueueError respectively.

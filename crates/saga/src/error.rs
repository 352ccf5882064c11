//! Saga and operation error types.

use common::SagaId;
use thiserror::Error;

use crate::status::SagaStatus;

/// Failure of a single operation's forward or compensating action.
///
/// The taxonomy matters to callers: validation and resource failures
/// before any effect need no compensation; collaborator failures made no
/// durable change in the failing step itself; consistency violations are
/// defects, not business failures.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Compliance or eligibility denied; no effect occurred.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Insufficient cash, wallet balance, or inventory.
    #[error("Insufficient resource: {0}")]
    InsufficientResource(String),

    /// An external collaborator (gateway, wallet, allocator) failed.
    #[error("{service} collaborator failed: {reason}")]
    ExternalCollaborator { service: String, reason: String },

    /// The books are internally inconsistent; a defect, not a business
    /// failure.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// Storage or serialization failure inside an operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OperationError {
    /// Creates a validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        OperationError::Validation(reason.into())
    }

    /// Creates an insufficient-resource failure.
    pub fn insufficient(reason: impl Into<String>) -> Self {
        OperationError::InsufficientResource(reason.into())
    }

    /// Creates an external-collaborator failure.
    pub fn collaborator(service: impl Into<String>, reason: impl Into<String>) -> Self {
        OperationError::ExternalCollaborator {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Creates an internal failure from any error.
    pub fn internal(source: impl std::fmt::Display) -> Self {
        OperationError::Internal(source.to_string())
    }
}

/// Errors that can occur during saga coordination.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A step failed; prior steps have been compensated.
    #[error("Step {step_number} '{operation}' failed: {source}")]
    Step {
        step_number: u32,
        operation: String,
        #[source]
        source: OperationError,
    },

    /// The saga is in an invalid status for the requested transition.
    #[error("Invalid saga status: expected {expected}, actual {actual}")]
    InvalidStatus {
        expected: &'static str,
        actual: SagaStatus,
    },

    /// No execution record exists for the saga ID.
    #[error("Saga not found: {0}")]
    NotFound(SagaId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for saga operations.
pub type Result<T> = std::result::Result<T, SagaError>;

use ledger::LedgerError;
use saga::{OperationError, SagaError};
use thiserror::Error;

/// Errors surfaced by the orchestrator's public API.
///
/// A step failure inside a flow is not an error here: it becomes a
/// structured [`crate::FlowResult::Failed`]. These variants cover the
/// machinery around the flows.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Saga coordination failed outside of normal step failure
    /// (invalid status, missing execution, storage).
    #[error("Saga error: {0}")]
    Saga(#[from] SagaError),

    /// Ledger read or write failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A read-only collaborator call failed.
    #[error("Collaborator error: {0}")]
    Operation(#[from] OperationError),

    /// Serialization failed while building a saga context.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

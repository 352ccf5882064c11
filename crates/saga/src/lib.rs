//! Saga pattern implementation for multi-step money movements.
//!
//! A saga is an ordered list of [`Operation`]s executed against a
//! [`SagaContext`], with step-by-step progress persisted through a
//! [`SagaRepository`]. If any step fails, the [`SagaCoordinator`]
//! compensates every previously completed step in strict reverse order,
//! so a failed flow never leaves partial, unrecorded money movement.

pub mod context;
pub mod coordinator;
pub mod error;
pub mod execution;
pub mod memory;
pub mod operation;
pub mod postgres;
pub mod repository;
pub mod status;

pub use context::SagaContext;
pub use coordinator::{SagaCoordinator, SagaOutcome};
pub use error::{OperationError, Result, SagaError};
pub use execution::{SagaExecution, SagaStep, StepStatus};
pub use memory::InMemorySagaRepository;
pub use operation::{Operation, StepResult};
pub use postgres::PostgresSagaRepository;
pub use repository::SagaRepository;
pub use status::{CompensationStatus, SagaStatus};

use async_trait::async_trait;
use common::SagaId;

use crate::execution::{SagaExecution, SagaStep};
use crate::status::CompensationStatus;
use crate::{Result, SagaError};

/// Persistence contract for saga execution and step records.
///
/// Every method is one atomic write or read; the coordinator's
/// one-step-one-transaction discipline is built from these units, so a
/// single call must never span multiple sagas or steps.
#[async_trait]
pub trait SagaRepository: Send + Sync {
    /// Persists a freshly created execution record.
    async fn create_execution(&self, execution: &SagaExecution) -> Result<()>;

    /// Overwrites the execution row (status transitions, counters).
    async fn update_execution(&self, execution: &SagaExecution) -> Result<()>;

    /// Appends a completed step record.
    async fn record_step(&self, step: &SagaStep) -> Result<()>;

    /// Records the compensation outcome for one step.
    async fn record_compensation(
        &self,
        saga_id: SagaId,
        step_number: u32,
        status: CompensationStatus,
        error: Option<String>,
    ) -> Result<()>;

    /// Loads an execution record.
    async fn get_execution(&self, saga_id: SagaId) -> Result<Option<SagaExecution>>;

    /// Loads a saga's step records in execution order.
    async fn get_steps(&self, saga_id: SagaId) -> Result<Vec<SagaStep>>;

    /// Finds executions whose metadata carries the given key/value,
    /// newest first. Backs provenance lookups by business reference.
    async fn find_by_metadata(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<SagaExecution>>;
}

/// Extension trait providing convenience lookups.
#[async_trait]
pub trait SagaRepositoryExt: SagaRepository {
    /// Loads an execution record, failing if it does not exist.
    async fn require_execution(&self, saga_id: SagaId) -> Result<SagaExecution> {
        self.get_execution(saga_id)
            .await?
            .ok_or(SagaError::NotFound(saga_id))
    }
}

impl<T: SagaRepository + ?Sized> SagaRepositoryExt for T {}

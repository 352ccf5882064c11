use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::SagaId;
use tokio::sync::RwLock;

use crate::execution::{SagaExecution, SagaStep};
use crate::repository::SagaRepository;
use crate::status::CompensationStatus;
use crate::{Result, SagaError};

#[derive(Default)]
struct State {
    executions: HashMap<SagaId, SagaExecution>,
    steps: Vec<SagaStep>,
}

/// In-memory saga repository for testing.
///
/// Provides the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemorySagaRepository {
    state: Arc<RwLock<State>>,
}

impl InMemorySagaRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored executions.
    pub async fn execution_count(&self) -> usize {
        self.state.read().await.executions.len()
    }

    /// Returns the total number of stored step records.
    pub async fn step_count(&self) -> usize {
        self.state.read().await.steps.len()
    }
}

#[async_trait]
impl SagaRepository for InMemorySagaRepository {
    async fn create_execution(&self, execution: &SagaExecution) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .executions
            .insert(execution.saga_id, execution.clone());
        Ok(())
    }

    async fn update_execution(&self, execution: &SagaExecution) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.executions.contains_key(&execution.saga_id) {
            return Err(SagaError::NotFound(execution.saga_id));
        }
        state
            .executions
            .insert(execution.saga_id, execution.clone());
        Ok(())
    }

    async fn record_step(&self, step: &SagaStep) -> Result<()> {
        let mut state = self.state.write().await;
        state.steps.push(step.clone());
        Ok(())
    }

    async fn record_compensation(
        &self,
        saga_id: SagaId,
        step_number: u32,
        status: CompensationStatus,
        error: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let step = state
            .steps
            .iter_mut()
            .find(|s| s.saga_execution_id == saga_id && s.step_number == step_number)
            .ok_or(SagaError::NotFound(saga_id))?;

        step.compensation_status = Some(status);
        step.compensation_error = error;
        step.compensated_at = Some(Utc::now());
        Ok(())
    }

    async fn get_execution(&self, saga_id: SagaId) -> Result<Option<SagaExecution>> {
        let state = self.state.read().await;
        Ok(state.executions.get(&saga_id).cloned())
    }

    async fn get_steps(&self, saga_id: SagaId) -> Result<Vec<SagaStep>> {
        let state = self.state.read().await;
        let mut steps: Vec<SagaStep> = state
            .steps
            .iter()
            .filter(|s| s.saga_execution_id == saga_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.step_number);
        Ok(steps)
    }

    async fn find_by_metadata(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<SagaExecution>> {
        let state = self.state.read().await;
        let mut matched: Vec<SagaExecution> = state
            .executions
            .values()
            .filter(|e| e.metadata.get(key) == Some(value))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.initiated_at.cmp(&a.initiated_at));
        Ok(matched)
    }
}

//! Persisted saga execution and step records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::SagaId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{CompensationStatus, SagaStatus};

/// One row per orchestrated flow invocation.
///
/// Created before the first step runs, mutated only by the coordinator
/// as steps advance. The metadata map is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaExecution {
    /// Opaque unique identifier.
    pub saga_id: SagaId,
    /// Current lifecycle status.
    pub status: SagaStatus,
    /// Immutable input metadata (entity ids, amounts) captured at creation.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Number of operations in the flow.
    pub steps_total: u32,
    /// Number of steps that completed.
    pub steps_completed: u32,
    /// When the execution record was created.
    pub initiated_at: DateTime<Utc>,
    /// When the saga completed, if it did.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the failing step raised, if any.
    pub failed_at: Option<DateTime<Utc>>,
    /// Why the failing step raised.
    pub failure_reason: Option<String>,
    /// 1-based number of the step that raised.
    pub failure_step: Option<u32>,
    /// When the compensation pass finished.
    pub compensated_at: Option<DateTime<Utc>>,
    /// Operator-supplied resolution payload.
    pub resolution_data: Option<serde_json::Value>,
    /// Operator who recorded the manual resolution.
    pub resolved_by: Option<String>,
    /// When the manual resolution was recorded.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SagaExecution {
    /// Creates a fresh execution record in `Initiated` status.
    pub fn new(metadata: HashMap<String, serde_json::Value>) -> Self {
        Self {
            saga_id: SagaId::new(),
            status: SagaStatus::Initiated,
            metadata,
            steps_total: 0,
            steps_completed: 0,
            initiated_at: Utc::now(),
            completed_at: None,
            failed_at: None,
            failure_reason: None,
            failure_step: None,
            compensated_at: None,
            resolution_data: None,
            resolved_by: None,
            resolved_at: None,
        }
    }
}

/// Status of an executed step.
///
/// Step rows are created only after a step succeeds, so `Completed` is
/// the only forward status; a step that raised before completing never
/// gets a row, and its absence marks the failure point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Completed,
}

impl StepStatus {
    /// Returns the status name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row per executed step, updated at most once if compensation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaStep {
    /// Row identifier.
    pub id: Uuid,
    /// The saga this step belongs to.
    pub saga_execution_id: SagaId,
    /// 1-based execution order.
    pub step_number: u32,
    /// Name of the operation that ran.
    pub operation_name: String,
    /// Forward status (always completed; see type docs).
    pub status: StepStatus,
    /// Opaque result payload the operation produced.
    pub result_data: Option<serde_json::Value>,
    /// When the step completed.
    pub executed_at: DateTime<Utc>,
    /// Outcome of the compensation attempt, if one ran.
    pub compensation_status: Option<CompensationStatus>,
    /// Error message of a failed compensation.
    pub compensation_error: Option<String>,
    /// When the compensation attempt ran.
    pub compensated_at: Option<DateTime<Utc>>,
}

impl SagaStep {
    /// Creates a completed step record.
    pub fn completed(
        saga_execution_id: SagaId,
        step_number: u32,
        operation_name: impl Into<String>,
        result_data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            saga_execution_id,
            step_number,
            operation_name: operation_name.into(),
            status: StepStatus::Completed,
            result_data,
            executed_at: Utc::now(),
            compensation_status: None,
            compensation_error: None,
            compensated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_execution_starts_initiated() {
        let mut metadata = HashMap::new();
        metadata.insert("payment_id".to_string(), serde_json::json!(42));

        let execution = SagaExecution::new(metadata);
        assert_eq!(execution.status, SagaStatus::Initiated);
        assert_eq!(execution.steps_completed, 0);
        assert!(execution.completed_at.is_none());
        assert_eq!(execution.metadata["payment_id"], serde_json::json!(42));
    }

    #[test]
    fn completed_step_has_no_compensation() {
        let step = SagaStep::completed(
            SagaId::new(),
            1,
            "credit_wallet",
            Some(serde_json::json!({"credited_minor": 1000})),
        );
        assert_eq!(step.status, StepStatus::Completed);
        assert!(step.compensation_status.is_none());
        assert!(step.compensated_at.is_none());
    }

    #[test]
    fn execution_serialization_roundtrip() {
        let execution = SagaExecution::new(HashMap::new());
        let json = serde_json::to_string(&execution).unwrap();
        let back: SagaExecution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.saga_id, execution.saga_id);
        assert_eq!(back.status, execution.status);
    }
}

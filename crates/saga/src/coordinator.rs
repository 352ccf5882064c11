//! Saga coordinator: ordered execution with reverse-order compensation.

use chrono::Utc;
use common::SagaId;
use serde_json::Value;

use crate::context::SagaContext;
use crate::error::{Result, SagaError};
use crate::execution::{SagaExecution, SagaStep};
use crate::operation::Operation;
use crate::repository::{SagaRepository, SagaRepositoryExt};
use crate::status::{CompensationStatus, SagaStatus};

/// Overall result of a successful saga run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SagaOutcome {
    /// The execution this outcome belongs to.
    pub saga_id: SagaId,
    /// How many steps ran (equals the flow's step count on success).
    pub steps_executed: u32,
}

/// Executes ordered operation lists against a context, persisting
/// step-by-step progress and compensating completed steps in strict
/// reverse order on failure.
///
/// Steps run strictly sequentially within one saga; multiple sagas may
/// run concurrently, contending only inside the stores each step calls.
pub struct SagaCoordinator<R: SagaRepository> {
    repository: R,
}

impl<R: SagaRepository> SagaCoordinator<R> {
    /// Creates a coordinator over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Runs the operations in order against the context.
    ///
    /// The execution record (already persisted by the caller) moves
    /// Initiated → Executing, then either to Completed, or through
    /// Failed to Compensated with every completed step's compensation
    /// attempted in reverse order. The original step failure is
    /// re-raised after compensation so callers can build a structured
    /// failure result; compensation failures themselves are recorded
    /// per step, never escalated.
    #[tracing::instrument(skip(self, ctx, operations), fields(saga_id = %ctx.saga_id()))]
    pub async fn execute(
        &self,
        ctx: &mut SagaContext,
        operations: &[Box<dyn Operation>],
    ) -> Result<SagaOutcome> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();
        let saga_id = ctx.saga_id();

        let mut execution = self.repository.require_execution(saga_id).await?;
        if !execution.status.can_execute() {
            return Err(SagaError::InvalidStatus {
                expected: "initiated",
                actual: execution.status,
            });
        }

        execution.steps_total = operations.len() as u32;
        execution.status = SagaStatus::Executing;
        self.repository.update_execution(&execution).await?;

        for (index, operation) in operations.iter().enumerate() {
            let step_number = index as u32 + 1;
            tracing::info!(
                step = step_number,
                operation = operation.name(),
                "saga step started"
            );

            match operation.execute(ctx).await {
                Ok(result) => {
                    let step = SagaStep::completed(
                        saga_id,
                        step_number,
                        operation.name(),
                        result.data,
                    );
                    self.repository.record_step(&step).await?;

                    execution.steps_completed = step_number;
                    self.repository.update_execution(&execution).await?;
                }
                Err(source) => {
                    tracing::warn!(
                        step = step_number,
                        operation = operation.name(),
                        error = %source,
                        "saga step failed"
                    );

                    execution.status = SagaStatus::Failed;
                    execution.failed_at = Some(Utc::now());
                    execution.failure_reason = Some(source.to_string());
                    execution.failure_step = Some(step_number);
                    self.repository.update_execution(&execution).await?;

                    self.compensate(ctx, operations, step_number, &mut execution)
                        .await?;

                    metrics::histogram!("saga_duration_seconds")
                        .record(saga_start.elapsed().as_secs_f64());
                    return Err(SagaError::Step {
                        step_number,
                        operation: operation.name().to_string(),
                        source,
                    });
                }
            }
        }

        execution.status = SagaStatus::Completed;
        execution.completed_at = Some(Utc::now());
        self.repository.update_execution(&execution).await?;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(%saga_id, duration, "saga completed");

        Ok(SagaOutcome {
            saga_id,
            steps_executed: execution.steps_completed,
        })
    }

    /// Compensates steps `failed_step - 1` down to `1`.
    ///
    /// Later effects are more likely to depend on earlier ones (a ledger
    /// entry referencing a wallet credit), so undoing in reverse never
    /// references already-undone state. A failed compensation is
    /// recorded on its step and does not stop compensating earlier
    /// steps.
    #[tracing::instrument(skip(self, ctx, operations, execution), fields(saga_id = %ctx.saga_id()))]
    async fn compensate(
        &self,
        ctx: &SagaContext,
        operations: &[Box<dyn Operation>],
        failed_step: u32,
        execution: &mut SagaExecution,
    ) -> Result<()> {
        let saga_id = ctx.saga_id();

        for step_number in (1..failed_step).rev() {
            let operation = &operations[step_number as usize - 1];
            match operation.compensate(ctx).await {
                Ok(()) => {
                    self.repository
                        .record_compensation(
                            saga_id,
                            step_number,
                            CompensationStatus::Compensated,
                            None,
                        )
                        .await?;
                }
                Err(e) => {
                    metrics::counter!("saga_compensation_failures_total").increment(1);
                    tracing::error!(
                        step = step_number,
                        operation = operation.name(),
                        error = %e,
                        "compensation step failed; continuing with earlier steps"
                    );
                    self.repository
                        .record_compensation(
                            saga_id,
                            step_number,
                            CompensationStatus::CompensationFailed,
                            Some(e.to_string()),
                        )
                        .await?;
                }
            }
        }

        execution.status = SagaStatus::Compensated;
        execution.compensated_at = Some(Utc::now());
        self.repository.update_execution(execution).await?;

        metrics::counter!("saga_compensated").increment(1);
        tracing::warn!(%saga_id, failed_step, "saga compensated");
        Ok(())
    }

    /// Operator escape hatch for sagas whose automatic compensation
    /// could not fully resolve: records who applied what resolution and
    /// moves the saga to ManuallyResolved. Not an automatic retry.
    #[tracing::instrument(skip(self, resolution_data))]
    pub async fn resume_saga(
        &self,
        saga_id: SagaId,
        resolved_by: &str,
        resolution_data: Value,
    ) -> Result<SagaExecution> {
        let mut execution = self.repository.require_execution(saga_id).await?;
        if !execution.status.can_resolve() {
            return Err(SagaError::InvalidStatus {
                expected: "failed or compensated",
                actual: execution.status,
            });
        }

        execution.status = SagaStatus::ManuallyResolved;
        execution.resolved_by = Some(resolved_by.to_string());
        execution.resolution_data = Some(resolution_data);
        execution.resolved_at = Some(Utc::now());
        self.repository.update_execution(&execution).await?;

        tracing::info!(%saga_id, resolved_by, "saga manually resolved");
        Ok(execution)
    }

    /// Loads an execution record.
    pub async fn get_execution(&self, saga_id: SagaId) -> Result<Option<SagaExecution>> {
        self.repository.get_execution(saga_id).await
    }

    /// Loads a saga's step records in execution order.
    pub async fn get_steps(&self, saga_id: SagaId) -> Result<Vec<SagaStep>> {
        self.repository.get_steps(saga_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use crate::memory::InMemorySagaRepository;
    use crate::operation::StepResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Test operation that records execute/compensate calls in a shared log.
    struct RecordingOp {
        name: &'static str,
        fail_execute: bool,
        fail_compensate: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingOp {
        fn ok(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn Operation> {
            Box::new(Self {
                name,
                fail_execute: false,
                fail_compensate: false,
                log: log.clone(),
            })
        }

        fn failing(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn Operation> {
            Box::new(Self {
                name,
                fail_execute: true,
                fail_compensate: false,
                log: log.clone(),
            })
        }

        fn bad_compensation(
            name: &'static str,
            log: &Arc<Mutex<Vec<String>>>,
        ) -> Box<dyn Operation> {
            Box::new(Self {
                name,
                fail_execute: false,
                fail_compensate: true,
                log: log.clone(),
            })
        }
    }

    #[async_trait]
    impl Operation for RecordingOp {
        fn name(&self) -> &str {
            self.name
        }

        async fn execute(
            &self,
            _ctx: &mut SagaContext,
        ) -> std::result::Result<StepResult, OperationError> {
            if self.fail_execute {
                return Err(OperationError::collaborator(self.name, "forced failure"));
            }
            self.log.lock().unwrap().push(format!("execute:{}", self.name));
            Ok(StepResult::with_data(json!({ "op": self.name })))
        }

        async fn compensate(&self, _ctx: &SagaContext) -> std::result::Result<(), OperationError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("compensate:{}", self.name));
            if self.fail_compensate {
                return Err(OperationError::collaborator(self.name, "undo failure"));
            }
            Ok(())
        }
    }

    async fn start_saga(
        repo: &InMemorySagaRepository,
    ) -> (SagaContext, SagaId) {
        let mut metadata = HashMap::new();
        metadata.insert("payment_id".to_string(), json!(42));
        let execution = SagaExecution::new(metadata.clone());
        let saga_id = execution.saga_id;
        repo.create_execution(&execution).await.unwrap();
        (SagaContext::new(saga_id, metadata), saga_id)
    }

    #[tokio::test]
    async fn happy_path_completes_all_steps() {
        let repo = InMemorySagaRepository::new();
        let coordinator = SagaCoordinator::new(repo.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut ctx, saga_id) = start_saga(&repo).await;

        let operations = vec![
            RecordingOp::ok("op_a", &log),
            RecordingOp::ok("op_b", &log),
            RecordingOp::ok("op_c", &log),
        ];

        let outcome = coordinator.execute(&mut ctx, &operations).await.unwrap();
        assert_eq!(outcome.saga_id, saga_id);
        assert_eq!(outcome.steps_executed, 3);

        let execution = coordinator.get_execution(saga_id).await.unwrap().unwrap();
        assert_eq!(execution.status, SagaStatus::Completed);
        assert_eq!(execution.steps_total, 3);
        assert_eq!(execution.steps_completed, 3);
        assert!(execution.completed_at.is_some());

        let steps = coordinator.get_steps(saga_id).await.unwrap();
        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| s.compensation_status.is_none()));
        assert_eq!(steps[0].operation_name, "op_a");
        assert_eq!(steps[2].operation_name, "op_c");
    }

    #[tokio::test]
    async fn failure_compensates_in_strict_reverse_order() {
        let repo = InMemorySagaRepository::new();
        let coordinator = SagaCoordinator::new(repo.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut ctx, saga_id) = start_saga(&repo).await;

        // Step 3 of 4 fails.
        let operations = vec![
            RecordingOp::ok("credit_wallet", &log),
            RecordingOp::ok("debit_wallet", &log),
            RecordingOp::failing("allocate_inventory", &log),
            RecordingOp::ok("mark_complete", &log),
        ];

        let err = coordinator.execute(&mut ctx, &operations).await.unwrap_err();
        match err {
            SagaError::Step {
                step_number,
                ref operation,
                ..
            } => {
                assert_eq!(step_number, 3);
                assert_eq!(operation, "allocate_inventory");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Compensation ran k-1 down to 1.
        let calls = log.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "execute:credit_wallet",
                "execute:debit_wallet",
                "compensate:debit_wallet",
                "compensate:credit_wallet",
            ]
        );

        let execution = coordinator.get_execution(saga_id).await.unwrap().unwrap();
        assert_eq!(execution.status, SagaStatus::Compensated);
        assert_eq!(execution.failure_step, Some(3));
        assert!(execution.failure_reason.is_some());
        assert!(execution.failed_at.is_some());
        assert!(execution.compensated_at.is_some());

        // Every completed step carries a compensation outcome; step 3
        // has no row at all.
        let steps = coordinator.get_steps(saga_id).await.unwrap();
        assert_eq!(steps.len(), 2);
        assert!(steps
            .iter()
            .all(|s| s.compensation_status == Some(CompensationStatus::Compensated)));
    }

    #[tokio::test]
    async fn first_step_failure_needs_no_compensation() {
        let repo = InMemorySagaRepository::new();
        let coordinator = SagaCoordinator::new(repo.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut ctx, saga_id) = start_saga(&repo).await;

        let operations = vec![
            RecordingOp::failing("verify_compliance", &log),
            RecordingOp::ok("credit_wallet", &log),
        ];

        let err = coordinator.execute(&mut ctx, &operations).await.unwrap_err();
        assert!(matches!(err, SagaError::Step { step_number: 1, .. }));

        assert!(log.lock().unwrap().is_empty());
        let execution = coordinator.get_execution(saga_id).await.unwrap().unwrap();
        assert_eq!(execution.status, SagaStatus::Compensated);
        assert!(coordinator.get_steps(saga_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn compensation_failure_does_not_stop_the_chain() {
        let repo = InMemorySagaRepository::new();
        let coordinator = SagaCoordinator::new(repo.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut ctx, saga_id) = start_saga(&repo).await;

        let operations = vec![
            RecordingOp::ok("op_a", &log),
            RecordingOp::bad_compensation("op_b", &log),
            RecordingOp::failing("op_c", &log),
        ];

        let err = coordinator.execute(&mut ctx, &operations).await.unwrap_err();
        assert!(matches!(err, SagaError::Step { step_number: 3, .. }));

        // op_b's compensation failed but op_a was still compensated.
        let calls = log.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "execute:op_a",
                "execute:op_b",
                "compensate:op_b",
                "compensate:op_a",
            ]
        );

        let steps = coordinator.get_steps(saga_id).await.unwrap();
        assert_eq!(
            steps[0].compensation_status,
            Some(CompensationStatus::Compensated)
        );
        assert_eq!(
            steps[1].compensation_status,
            Some(CompensationStatus::CompensationFailed)
        );
        assert!(steps[1].compensation_error.is_some());

        // The saga still lands in Compensated, flagged for review.
        let execution = coordinator.get_execution(saga_id).await.unwrap().unwrap();
        assert_eq!(execution.status, SagaStatus::Compensated);
    }

    #[tokio::test]
    async fn execute_rejects_non_initiated_saga() {
        let repo = InMemorySagaRepository::new();
        let coordinator = SagaCoordinator::new(repo.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut ctx, _) = start_saga(&repo).await;

        let operations = vec![RecordingOp::ok("op_a", &log)];
        coordinator.execute(&mut ctx, &operations).await.unwrap();

        // Second run against the same execution record must refuse.
        let err = coordinator.execute(&mut ctx, &operations).await.unwrap_err();
        assert!(matches!(
            err,
            SagaError::InvalidStatus {
                actual: SagaStatus::Completed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn execute_unknown_saga_fails() {
        let repo = InMemorySagaRepository::new();
        let coordinator = SagaCoordinator::new(repo);
        let mut ctx = SagaContext::new(SagaId::new(), HashMap::new());

        let err = coordinator.execute(&mut ctx, &[]).await.unwrap_err();
        assert!(matches!(err, SagaError::NotFound(_)));
    }

    #[tokio::test]
    async fn resume_saga_records_operator_resolution() {
        let repo = InMemorySagaRepository::new();
        let coordinator = SagaCoordinator::new(repo.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut ctx, saga_id) = start_saga(&repo).await;

        let operations = vec![
            RecordingOp::ok("op_a", &log),
            RecordingOp::failing("op_b", &log),
        ];
        let _ = coordinator.execute(&mut ctx, &operations).await;

        let resolved = coordinator
            .resume_saga(saga_id, "ops@example.com", json!({"action": "wallet re-credited"}))
            .await
            .unwrap();

        assert_eq!(resolved.status, SagaStatus::ManuallyResolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("ops@example.com"));
        assert!(resolved.resolved_at.is_some());
        assert_eq!(
            resolved.resolution_data,
            Some(json!({"action": "wallet re-credited"}))
        );
    }

    #[tokio::test]
    async fn resume_saga_rejects_completed_saga() {
        let repo = InMemorySagaRepository::new();
        let coordinator = SagaCoordinator::new(repo.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut ctx, saga_id) = start_saga(&repo).await;

        let operations = vec![RecordingOp::ok("op_a", &log)];
        coordinator.execute(&mut ctx, &operations).await.unwrap();

        let err = coordinator
            .resume_saga(saga_id, "ops@example.com", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SagaError::InvalidStatus {
                actual: SagaStatus::Completed,
                ..
            }
        ));
    }
}

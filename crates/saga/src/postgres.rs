use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::SagaId;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::execution::{SagaExecution, SagaStep, StepStatus};
use crate::repository::SagaRepository;
use crate::status::{CompensationStatus, SagaStatus};
use crate::{Result, SagaError};

/// PostgreSQL-backed saga repository.
#[derive(Clone)]
pub struct PostgresSagaRepository {
    pool: PgPool,
}

impl PostgresSagaRepository {
    /// Creates a new PostgreSQL saga repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn corrupt(message: String) -> SagaError {
        SagaError::Serialization(serde_json::Error::io(std::io::Error::other(message)))
    }

    fn row_to_execution(row: PgRow) -> Result<SagaExecution> {
        let status: String = row.try_get("status")?;
        let metadata_json: serde_json::Value = row.try_get("metadata")?;
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_value(metadata_json)?;

        Ok(SagaExecution {
            saga_id: SagaId::from_uuid(row.try_get::<Uuid, _>("saga_id")?),
            status: status.parse::<SagaStatus>().map_err(Self::corrupt)?,
            metadata,
            steps_total: row.try_get::<i32, _>("steps_total")? as u32,
            steps_completed: row.try_get::<i32, _>("steps_completed")? as u32,
            initiated_at: row.try_get("initiated_at")?,
            completed_at: row.try_get("completed_at")?,
            failed_at: row.try_get("failed_at")?,
            failure_reason: row.try_get("failure_reason")?,
            failure_step: row
                .try_get::<Option<i32>, _>("failure_step")?
                .map(|n| n as u32),
            compensated_at: row.try_get("compensated_at")?,
            resolution_data: row.try_get("resolution_data")?,
            resolved_by: row.try_get("resolved_by")?,
            resolved_at: row.try_get("resolved_at")?,
        })
    }

    fn row_to_step(row: PgRow) -> Result<SagaStep> {
        let compensation_status: Option<String> = row.try_get("compensation_status")?;
        let compensation_status = compensation_status
            .map(|s| s.parse::<CompensationStatus>().map_err(Self::corrupt))
            .transpose()?;

        Ok(SagaStep {
            id: row.try_get("id")?,
            saga_execution_id: SagaId::from_uuid(row.try_get::<Uuid, _>("saga_execution_id")?),
            step_number: row.try_get::<i32, _>("step_number")? as u32,
            operation_name: row.try_get("operation_name")?,
            status: StepStatus::Completed,
            result_data: row.try_get("result_data")?,
            executed_at: row.try_get("executed_at")?,
            compensation_status,
            compensation_error: row.try_get("compensation_error")?,
            compensated_at: row.try_get("compensated_at")?,
        })
    }
}

const EXECUTION_COLUMNS: &str = "saga_id, status, metadata, steps_total, steps_completed, \
     initiated_at, completed_at, failed_at, failure_reason, failure_step, \
     compensated_at, resolution_data, resolved_by, resolved_at";

#[async_trait]
impl SagaRepository for PostgresSagaRepository {
    async fn create_execution(&self, execution: &SagaExecution) -> Result<()> {
        let metadata = serde_json::to_value(&execution.metadata)?;

        sqlx::query(
            r#"
            INSERT INTO saga_executions (
                saga_id, status, metadata, steps_total, steps_completed, initiated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(execution.saga_id.as_uuid())
        .bind(execution.status.as_str())
        .bind(metadata)
        .bind(execution.steps_total as i32)
        .bind(execution.steps_completed as i32)
        .bind(execution.initiated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_execution(&self, execution: &SagaExecution) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE saga_executions SET
                status = $2,
                steps_total = $3,
                steps_completed = $4,
                completed_at = $5,
                failed_at = $6,
                failure_reason = $7,
                failure_step = $8,
                compensated_at = $9,
                resolution_data = $10,
                resolved_by = $11,
                resolved_at = $12
            WHERE saga_id = $1
            "#,
        )
        .bind(execution.saga_id.as_uuid())
        .bind(execution.status.as_str())
        .bind(execution.steps_total as i32)
        .bind(execution.steps_completed as i32)
        .bind(execution.completed_at)
        .bind(execution.failed_at)
        .bind(&execution.failure_reason)
        .bind(execution.failure_step.map(|n| n as i32))
        .bind(execution.compensated_at)
        .bind(&execution.resolution_data)
        .bind(&execution.resolved_by)
        .bind(execution.resolved_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SagaError::NotFound(execution.saga_id));
        }
        Ok(())
    }

    async fn record_step(&self, step: &SagaStep) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO saga_steps (
                id, saga_execution_id, step_number, operation_name,
                status, result_data, executed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(step.id)
        .bind(step.saga_execution_id.as_uuid())
        .bind(step.step_number as i32)
        .bind(&step.operation_name)
        .bind(step.status.as_str())
        .bind(&step.result_data)
        .bind(step.executed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_compensation(
        &self,
        saga_id: SagaId,
        step_number: u32,
        status: CompensationStatus,
        error: Option<String>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE saga_steps SET
                compensation_status = $3,
                compensation_error = $4,
                compensated_at = $5
            WHERE saga_execution_id = $1 AND step_number = $2
            "#,
        )
        .bind(saga_id.as_uuid())
        .bind(step_number as i32)
        .bind(status.as_str())
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SagaError::NotFound(saga_id));
        }
        Ok(())
    }

    async fn get_execution(&self, saga_id: SagaId) -> Result<Option<SagaExecution>> {
        let row = sqlx::query(&format!(
            "SELECT {EXECUTION_COLUMNS} FROM saga_executions WHERE saga_id = $1"
        ))
        .bind(saga_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_execution).transpose()
    }

    async fn get_steps(&self, saga_id: SagaId) -> Result<Vec<SagaStep>> {
        let rows = sqlx::query(
            r#"
            SELECT id, saga_execution_id, step_number, operation_name, status,
                   result_data, executed_at, compensation_status,
                   compensation_error, compensated_at
            FROM saga_steps
            WHERE saga_execution_id = $1
            ORDER BY step_number ASC
            "#,
        )
        .bind(saga_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_step).collect()
    }

    async fn find_by_metadata(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<SagaExecution>> {
        // JSONB containment uses the GIN index on metadata.
        let needle = serde_json::json!({ key: value });

        let rows = sqlx::query(&format!(
            "SELECT {EXECUTION_COLUMNS} FROM saga_executions \
             WHERE metadata @> $1 ORDER BY initiated_at DESC"
        ))
        .bind(needle)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_execution).collect()
    }
}

//! The operation contract: one unit of business work with an undo.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::SagaContext;
use crate::error::OperationError;

/// Opaque result payload a completed step records.
#[derive(Debug, Clone, Default)]
pub struct StepResult {
    /// Serialized result data later steps or auditors may need.
    pub data: Option<Value>,
}

impl StepResult {
    /// A result carrying no data.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A result carrying the given payload.
    pub fn with_data(data: Value) -> Self {
        Self { data: Some(data) }
    }
}

/// A polymorphic unit of work within a saga.
///
/// `execute` performs one business step inside its own atomic unit
/// (a wallet mutation, a ledger pair, an external call). `compensate`
/// undoes the effect of a *successful* execute; it must be safe to call
/// even if the forward effect was only partially visible, and expected
/// failure modes must be returned, not panicked, because the coordinator
/// records compensation failures and keeps compensating earlier steps.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Stable operation name, recorded on the step row.
    fn name(&self) -> &str;

    /// Performs the step's forward work.
    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError>;

    /// Undoes a successful execute. Default: nothing to undo.
    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        let _ = ctx;
        Ok(())
    }
}

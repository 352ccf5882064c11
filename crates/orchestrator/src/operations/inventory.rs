use std::sync::Arc;

use async_trait::async_trait;
use saga::{Operation, OperationError, SagaContext, StepResult};
use serde_json::{Value, json};

use crate::flows::{META_INVESTMENT_ID, META_USER_ID, SHARED_ALLOCATION_ID};
use crate::operations::{require_str, require_user};
use crate::services::AllocationService;

/// Reserves inventory for the investment; compensation releases the
/// reservation.
pub struct AllocateInventory {
    allocation: Arc<dyn AllocationService>,
}

impl AllocateInventory {
    pub fn new(allocation: Arc<dyn AllocationService>) -> Self {
        Self { allocation }
    }
}

#[async_trait]
impl Operation for AllocateInventory {
    fn name(&self) -> &str {
        "allocate_inventory"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let investment_id = require_str(ctx, META_INVESTMENT_ID)?.to_string();
        let user = require_user(ctx, META_USER_ID)?;

        let allocation = self.allocation.allocate(&investment_id, user).await?;
        ctx.set_shared(SHARED_ALLOCATION_ID, json!(allocation.allocation_id));
        Ok(StepResult::with_data(json!({
            "allocation_id": allocation.allocation_id,
            "investment_id": investment_id,
        })))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        let Some(allocation_id) = ctx.get_shared(SHARED_ALLOCATION_ID).and_then(Value::as_str)
        else {
            return Ok(());
        };
        self.allocation.release(allocation_id).await
    }
}

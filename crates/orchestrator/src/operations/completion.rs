use std::sync::Arc;

use async_trait::async_trait;
use saga::{Operation, OperationError, SagaContext, StepResult};
use serde_json::json;

use crate::operations::require_str;
use crate::services::StatusService;

/// Final step of every flow: flips the business entity to completed.
/// Compensation marks it reverted instead.
pub struct MarkEntityComplete {
    status: Arc<dyn StatusService>,
    entity_type: &'static str,
    id_key: &'static str,
    name: String,
}

impl MarkEntityComplete {
    pub fn new(
        status: Arc<dyn StatusService>,
        entity_type: &'static str,
        id_key: &'static str,
    ) -> Self {
        Self {
            status,
            entity_type,
            id_key,
            name: format!("mark_{entity_type}_complete"),
        }
    }
}

#[async_trait]
impl Operation for MarkEntityComplete {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let entity_id = require_str(ctx, self.id_key)?;
        self.status.mark_complete(self.entity_type, entity_id).await?;
        Ok(StepResult::with_data(json!({
            "entity_type": self.entity_type,
            "entity_id": entity_id,
            "status": "completed",
        })))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        let entity_id = require_str(ctx, self.id_key)?;
        self.status.mark_reverted(self.entity_type, entity_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::context;
    use crate::services::InMemoryStatusService;

    #[tokio::test]
    async fn marks_complete_and_reverts_on_compensation() {
        let status = Arc::new(InMemoryStatusService::new());
        let op = MarkEntityComplete::new(status.clone(), "investment", "investment_id");
        assert_eq!(op.name(), "mark_investment_complete");

        let mut ctx = context(&[("investment_id", json!("inv-1"))]);
        op.execute(&mut ctx).await.unwrap();
        assert_eq!(
            status.status_of("investment", "inv-1").as_deref(),
            Some("completed")
        );

        op.compensate(&ctx).await.unwrap();
        assert_eq!(
            status.status_of("investment", "inv-1").as_deref(),
            Some("reverted")
        );
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use saga::{Operation, OperationError, SagaContext, StepResult};
use serde_json::json;

use crate::operations::{require_amount, require_user};
use crate::services::{ComplianceService, OperationKind};

/// First step of every flow: checks the acting user's eligibility
/// before any money moves. Needs no compensation.
pub struct VerifyCompliance {
    compliance: Arc<dyn ComplianceService>,
    kind: OperationKind,
    user_key: &'static str,
    amount_key: &'static str,
}

impl VerifyCompliance {
    pub fn new(
        compliance: Arc<dyn ComplianceService>,
        kind: OperationKind,
        user_key: &'static str,
        amount_key: &'static str,
    ) -> Self {
        Self {
            compliance,
            kind,
            user_key,
            amount_key,
        }
    }
}

#[async_trait]
impl Operation for VerifyCompliance {
    fn name(&self) -> &str {
        match self.kind {
            OperationKind::Referral => "verify_referral_compliance",
            _ => "verify_compliance",
        }
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let user = require_user(ctx, self.user_key)?;
        let amount = require_amount(ctx, self.amount_key)?;
        self.compliance
            .check_eligibility(user, self.kind, amount)
            .await?;
        Ok(StepResult::with_data(json!({
            "user_id": user.to_string(),
            "kind": self.kind.as_str(),
            "amount_minor": amount.minor(),
        })))
    }
}

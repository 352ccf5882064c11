use async_trait::async_trait;
use common::Money;
use saga::{Operation, OperationError, SagaContext, StepResult};
use serde_json::json;

use crate::flows::{
    META_CAMPAIGN_DISCOUNT_MINOR, META_CAMPAIGN_ID, META_INVESTMENT_AMOUNT_MINOR,
    SHARED_DISCOUNT_MINOR,
};
use crate::operations::require_amount;

/// Computes the effective campaign discount for an investment and
/// publishes it for the wallet-debit and liability steps.
///
/// The discount is capped at the investment amount; with no campaign in
/// the metadata the discount is zero and later steps treat the purchase
/// as full price. Pure calculation, nothing to compensate.
pub struct CalculateCampaignBenefit;

#[async_trait]
impl Operation for CalculateCampaignBenefit {
    fn name(&self) -> &str {
        "calculate_campaign_benefit"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let discount = match ctx.metadata_str(META_CAMPAIGN_ID) {
            Some(_) => {
                let granted = require_amount(ctx, META_CAMPAIGN_DISCOUNT_MINOR)?;
                let investment = require_amount(ctx, META_INVESTMENT_AMOUNT_MINOR)?;
                if granted.is_negative() {
                    return Err(OperationError::validation(format!(
                        "campaign discount cannot be negative, got {granted}"
                    )));
                }
                granted.min(investment)
            }
            None => Money::zero(),
        };

        ctx.set_shared(SHARED_DISCOUNT_MINOR, json!(discount.minor()));
        Ok(StepResult::with_data(json!({
            "discount_minor": discount.minor(),
        })))
    }
}

//! Concrete saga operations the flows are assembled from.
//!
//! Each operation reads its inputs from the saga context (metadata for
//! values fixed at creation, the shared store for values computed by
//! earlier steps) and performs exactly one atomic unit of work.

mod campaign;
mod completion;
mod compliance;
mod inventory;
mod posting;
mod wallet;
mod withdrawal;

pub use campaign::CalculateCampaignBenefit;
pub use completion::MarkEntityComplete;
pub use compliance::VerifyCompliance;
pub use inventory::AllocateInventory;
pub use posting::{RecordLedgerCashout, RecordLedgerLiability, RecordLedgerReceipt};
pub use wallet::{CreditWallet, DebitWallet};
pub use withdrawal::{CalculateWithholdingTax, CallExternalTransfer, VerifyAdminSolvency};

use common::{Money, UserId};
use saga::{OperationError, SagaContext};
use uuid::Uuid;

/// Reads a required string from the saga metadata.
pub(crate) fn require_str<'a>(ctx: &'a SagaContext, key: &str) -> Result<&'a str, OperationError> {
    ctx.metadata_str(key)
        .ok_or_else(|| OperationError::validation(format!("missing '{key}' in saga metadata")))
}

/// Reads a required user id from the saga metadata.
pub(crate) fn require_user(ctx: &SagaContext, key: &str) -> Result<UserId, OperationError> {
    let raw = require_str(ctx, key)?;
    let uuid = Uuid::parse_str(raw)
        .map_err(|err| OperationError::validation(format!("invalid user id in '{key}': {err}")))?;
    Ok(UserId::from_uuid(uuid))
}

/// Reads a required amount in minor units from the saga metadata.
pub(crate) fn require_amount(ctx: &SagaContext, key: &str) -> Result<Money, OperationError> {
    ctx.metadata_i64(key)
        .map(Money::from_minor)
        .ok_or_else(|| OperationError::validation(format!("missing '{key}' in saga metadata")))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_user_parses_uuid_strings() {
        let user = UserId::new();
        let ctx = test_support::context(&[("user_id", json!(user.to_string()))]);
        assert_eq!(require_user(&ctx, "user_id").unwrap(), user);
    }

    #[test]
    fn missing_or_malformed_inputs_fail_validation() {
        let ctx = test_support::context(&[("user_id", json!("not-a-uuid"))]);
        assert!(matches!(
            require_user(&ctx, "user_id"),
            Err(OperationError::Validation(_))
        ));
        assert!(matches!(
            require_amount(&ctx, "amount_minor"),
            Err(OperationError::Validation(_))
        ));
        assert!(matches!(
            require_str(&ctx, "payment_id"),
            Err(OperationError::Validation(_))
        ));
    }
}

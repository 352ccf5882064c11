//! Withdrawal-specific operations: solvency gate, withholding tax, and
//! the external payout.

use std::sync::Arc;

use async_trait::async_trait;
use common::Money;
use ledger::Ledger;
use saga::{Operation, OperationError, SagaContext, StepResult};
use serde_json::{Value, json};

use crate::flows::{
    META_AMOUNT_MINOR, META_USER_ID, META_WITHDRAWAL_ID, SHARED_TRANSFER_REFERENCE,
    SHARED_WITHHOLDING_TAX_MINOR,
};
use crate::operations::{require_amount, require_str, require_user};
use crate::services::{TaxService, TransferService};

/// Gates a withdrawal on the operator's books: the accounting identity
/// must hold and cash must cover the requested amount.
///
/// Read-only, so it needs no compensation; placing it before any
/// money-moving step keeps insolvent withdrawals from touching wallets
/// or the journal at all.
pub struct VerifyAdminSolvency {
    ledger: Ledger,
}

impl VerifyAdminSolvency {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Operation for VerifyAdminSolvency {
    fn name(&self) -> &str {
        "verify_admin_solvency"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let required = require_amount(ctx, META_AMOUNT_MINOR)?;

        let report = self
            .ledger
            .calculate_solvency()
            .await
            .map_err(OperationError::internal)?;
        if !report.is_balanced() {
            return Err(OperationError::Consistency(format!(
                "accounting identity off by {} minor units",
                report.discrepancy.minor()
            )));
        }
        if report.cash < required {
            return Err(OperationError::insufficient(format!(
                "cash {} cannot cover withdrawal of {required}",
                report.cash
            )));
        }

        Ok(StepResult::with_data(json!({
            "cash_minor": report.cash.minor(),
            "required_minor": required.minor(),
            "is_solvent": report.is_solvent,
        })))
    }
}

/// Computes the withholding tax on the gross withdrawal and publishes
/// it for the cashout and transfer steps. Pure calculation.
pub struct CalculateWithholdingTax {
    tax: Arc<dyn TaxService>,
}

impl CalculateWithholdingTax {
    pub fn new(tax: Arc<dyn TaxService>) -> Self {
        Self { tax }
    }
}

#[async_trait]
impl Operation for CalculateWithholdingTax {
    fn name(&self) -> &str {
        "calculate_withholding_tax"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let gross = require_amount(ctx, META_AMOUNT_MINOR)?;
        let withheld = self.tax.compute_withholding(gross, ctx).await?;

        ctx.set_shared(SHARED_WITHHOLDING_TAX_MINOR, json!(withheld.minor()));
        Ok(StepResult::with_data(json!({
            "gross_minor": gross.minor(),
            "withholding_minor": withheld.minor(),
            "net_minor": (gross - withheld).minor(),
        })))
    }
}

/// Initiates the external payout for the net amount; compensation voids
/// the transfer at the provider.
pub struct CallExternalTransfer {
    transfer: Arc<dyn TransferService>,
}

impl CallExternalTransfer {
    pub fn new(transfer: Arc<dyn TransferService>) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl Operation for CallExternalTransfer {
    fn name(&self) -> &str {
        "call_external_transfer"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let withdrawal_id = require_str(ctx, META_WITHDRAWAL_ID)?.to_string();
        let user = require_user(ctx, META_USER_ID)?;
        let gross = require_amount(ctx, META_AMOUNT_MINOR)?;
        let withheld = Money::from_minor(ctx.shared_i64(SHARED_WITHHOLDING_TAX_MINOR).unwrap_or(0));
        let net = gross - withheld;

        let ack = self.transfer.transfer(&withdrawal_id, user, net).await?;
        ctx.set_shared(SHARED_TRANSFER_REFERENCE, json!(ack.transfer_reference));
        Ok(StepResult::with_data(json!({
            "transfer_reference": ack.transfer_reference,
            "net_minor": net.minor(),
        })))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        let Some(reference) = ctx.get_shared(SHARED_TRANSFER_REFERENCE).and_then(Value::as_str)
        else {
            return Ok(());
        };
        self.transfer.void(reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::context;
    use crate::services::{FlatRateTaxService, InMemoryTransferService};
    use common::UserId;
    use ledger::{Account, InMemoryLedgerStore, Posting, ReferenceType};

    fn withdrawal_ctx(amount_minor: i64) -> SagaContext {
        context(&[
            (META_WITHDRAWAL_ID, json!("wd-1")),
            (META_USER_ID, json!(UserId::new().to_string())),
            (META_AMOUNT_MINOR, json!(amount_minor)),
        ])
    }

    async fn funded_ledger(cash_minor: i64) -> Ledger {
        let ledger = Ledger::new(InMemoryLedgerStore::new());
        ledger
            .record_double_entry(Posting::new(
                Account::Cash,
                Account::Revenue,
                Money::from_minor(cash_minor),
                ReferenceType::Payment,
                "seed",
                "seed cash",
            ))
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn solvency_gate_passes_with_cover() {
        let ledger = funded_ledger(10_000).await;
        let op = VerifyAdminSolvency::new(ledger);
        let mut ctx = withdrawal_ctx(5_000);

        let result = op.execute(&mut ctx).await.unwrap();
        assert_eq!(result.data.unwrap()["cash_minor"], 10_000);
    }

    #[tokio::test]
    async fn solvency_gate_rejects_uncovered_withdrawal() {
        let ledger = funded_ledger(3_000).await;
        let op = VerifyAdminSolvency::new(ledger);
        let mut ctx = withdrawal_ctx(5_000);

        assert!(matches!(
            op.execute(&mut ctx).await,
            Err(OperationError::InsufficientResource(_))
        ));
    }

    #[tokio::test]
    async fn withholding_is_published_for_later_steps() {
        let op = CalculateWithholdingTax::new(Arc::new(FlatRateTaxService::new(1_000)));
        let mut ctx = withdrawal_ctx(5_000);

        let result = op.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.shared_i64(SHARED_WITHHOLDING_TAX_MINOR), Some(500));
        assert_eq!(result.data.unwrap()["net_minor"], 4_500);
    }

    #[tokio::test]
    async fn transfer_uses_net_and_voids_on_compensation() {
        let service = Arc::new(InMemoryTransferService::new());
        let op = CallExternalTransfer::new(service.clone());
        let mut ctx = withdrawal_ctx(5_000);
        ctx.set_shared(SHARED_WITHHOLDING_TAX_MINOR, json!(500));

        let result = op.execute(&mut ctx).await.unwrap();
        assert_eq!(result.data.unwrap()["net_minor"], 4_500);

        let reference = ctx
            .get_shared(SHARED_TRANSFER_REFERENCE)
            .and_then(Value::as_str)
            .unwrap()
            .to_string();
        op.compensate(&ctx).await.unwrap();
        assert!(service.is_voided(&reference));
    }
}

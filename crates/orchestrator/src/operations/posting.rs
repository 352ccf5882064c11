//! Ledger-writing operations.
//!
//! Each forward step records one balanced pair and stashes the pair in
//! the shared context; compensation appends the reversing pair (the
//! journal is append-only, entries are never deleted).

use async_trait::async_trait;
use common::Money;
use ledger::{Account, EntryPair, Ledger, Posting, ReferenceType};
use saga::{Operation, OperationError, SagaContext, StepResult};
use serde_json::json;

use crate::flows::{
    META_AMOUNT_MINOR, META_BONUS_MINOR, META_CAMPAIGN_ID, META_PAYMENT_AMOUNT_MINOR,
    META_PAYMENT_ID, META_REFERRAL_ID, META_WITHDRAWAL_ID, SHARED_CASHOUT_PAIR,
    SHARED_DISCOUNT_MINOR, SHARED_LIABILITY_PAIR, SHARED_RECEIPT_PAIR,
    SHARED_WITHHOLDING_TAX_MINOR,
};
use crate::operations::{require_amount, require_str};

async fn record_and_stash(
    ledger: &Ledger,
    ctx: &mut SagaContext,
    posting: Posting,
    pair_key: &str,
) -> Result<StepResult, OperationError> {
    let amount = posting.amount_minor;
    let pair = ledger
        .record_double_entry(posting)
        .await
        .map_err(OperationError::internal)?;

    ctx.set_shared(
        pair_key,
        serde_json::to_value(&pair).map_err(OperationError::internal)?,
    );
    Ok(StepResult::with_data(json!({
        "debit_entry_id": pair.debit.id.to_string(),
        "credit_entry_id": pair.credit.id.to_string(),
        "amount_minor": amount.minor(),
    })))
}

async fn reverse_stashed(
    ledger: &Ledger,
    ctx: &SagaContext,
    pair_key: &str,
    description: &str,
) -> Result<(), OperationError> {
    let Some(value) = ctx.get_shared(pair_key) else {
        // Step was skipped or never recorded a pair; nothing to undo.
        return Ok(());
    };
    let pair: EntryPair =
        serde_json::from_value(value.clone()).map_err(OperationError::internal)?;
    ledger
        .record_double_entry(Posting::reversal_of(&pair, description))
        .await
        .map_err(OperationError::internal)?;
    Ok(())
}

/// Records the receipt of a user payment: debit cash, credit revenue.
pub struct RecordLedgerReceipt {
    ledger: Ledger,
}

impl RecordLedgerReceipt {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Operation for RecordLedgerReceipt {
    fn name(&self) -> &str {
        "record_ledger_receipt"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let amount = require_amount(ctx, META_PAYMENT_AMOUNT_MINOR)?;
        let payment_id = require_str(ctx, META_PAYMENT_ID)?.to_string();

        let posting = Posting::new(
            Account::Cash,
            Account::Revenue,
            amount,
            ReferenceType::Payment,
            payment_id.clone(),
            format!("payment {payment_id} received"),
        );
        record_and_stash(&self.ledger, ctx, posting, SHARED_RECEIPT_PAIR).await
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        reverse_stashed(
            &self.ledger,
            ctx,
            SHARED_RECEIPT_PAIR,
            "reversal of payment receipt",
        )
        .await
    }
}

/// Which obligation a liability accrual records.
enum LiabilitySource {
    /// Campaign discount owed to the user; amount comes from the shared
    /// discount and the step is skipped when it is zero.
    CampaignDiscount,
    /// Referral bonus owed to the referrer; amount comes from metadata.
    ReferralBonus,
}

/// Accrues an obligation on the books: debit expenses, credit
/// liabilities.
pub struct RecordLedgerLiability {
    ledger: Ledger,
    source: LiabilitySource,
}

impl RecordLedgerLiability {
    /// Liability for a campaign discount granted on an investment.
    pub fn campaign(ledger: Ledger) -> Self {
        Self {
            ledger,
            source: LiabilitySource::CampaignDiscount,
        }
    }

    /// Liability for a referral bonus, accrued before the payout.
    pub fn referral(ledger: Ledger) -> Self {
        Self {
            ledger,
            source: LiabilitySource::ReferralBonus,
        }
    }
}

#[async_trait]
impl Operation for RecordLedgerLiability {
    fn name(&self) -> &str {
        "record_ledger_liability"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let (amount, reference_type, reference_id, description) = match self.source {
            LiabilitySource::CampaignDiscount => {
                let discount = Money::from_minor(ctx.shared_i64(SHARED_DISCOUNT_MINOR).unwrap_or(0));
                if discount.is_zero() {
                    return Ok(StepResult::with_data(json!({
                        "skipped": true,
                        "amount_minor": 0,
                    })));
                }
                let campaign_id = require_str(ctx, META_CAMPAIGN_ID)?.to_string();
                (
                    discount,
                    ReferenceType::CampaignUsage,
                    campaign_id.clone(),
                    format!("campaign {campaign_id} discount granted"),
                )
            }
            LiabilitySource::ReferralBonus => {
                let bonus = require_amount(ctx, META_BONUS_MINOR)?;
                let referral_id = require_str(ctx, META_REFERRAL_ID)?.to_string();
                (
                    bonus,
                    ReferenceType::Referral,
                    referral_id.clone(),
                    format!("referral {referral_id} bonus accrued"),
                )
            }
        };

        let posting = Posting::new(
            Account::Expenses,
            Account::Liabilities,
            amount,
            reference_type,
            reference_id,
            description,
        );
        record_and_stash(&self.ledger, ctx, posting, SHARED_LIABILITY_PAIR).await
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        reverse_stashed(
            &self.ledger,
            ctx,
            SHARED_LIABILITY_PAIR,
            "reversal of liability accrual",
        )
        .await
    }
}

/// Records a withdrawal payout net of withholding tax: debit
/// liabilities, credit cash.
pub struct RecordLedgerCashout {
    ledger: Ledger,
}

impl RecordLedgerCashout {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Operation for RecordLedgerCashout {
    fn name(&self) -> &str {
        "record_ledger_cashout"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let gross = require_amount(ctx, META_AMOUNT_MINOR)?;
        let withheld = Money::from_minor(ctx.shared_i64(SHARED_WITHHOLDING_TAX_MINOR).unwrap_or(0));
        let net = gross - withheld;
        if !net.is_positive() {
            return Err(OperationError::validation(format!(
                "withdrawal nets to {net} after withholding {withheld}"
            )));
        }

        let withdrawal_id = require_str(ctx, META_WITHDRAWAL_ID)?.to_string();
        let posting = Posting::new(
            Account::Liabilities,
            Account::Cash,
            net,
            ReferenceType::Withdrawal,
            withdrawal_id.clone(),
            format!("withdrawal {withdrawal_id} paid out, {withheld} withheld"),
        );
        record_and_stash(&self.ledger, ctx, posting, SHARED_CASHOUT_PAIR).await
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        reverse_stashed(
            &self.ledger,
            ctx,
            SHARED_CASHOUT_PAIR,
            "reversal of withdrawal payout",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::context;
    use ledger::InMemoryLedgerStore;

    fn ledger() -> Ledger {
        Ledger::new(InMemoryLedgerStore::new())
    }

    #[tokio::test]
    async fn receipt_debits_cash_and_credits_revenue() {
        let ledger = ledger();
        let op = RecordLedgerReceipt::new(ledger.clone());
        let mut ctx = context(&[
            (META_PAYMENT_ID, json!("pay-1")),
            (META_PAYMENT_AMOUNT_MINOR, json!(10_000)),
        ]);

        op.execute(&mut ctx).await.unwrap();
        assert_eq!(
            ledger.get_account_balance(Account::Cash).await.unwrap(),
            Money::from_minor(10_000)
        );
        assert_eq!(
            ledger.get_account_balance(Account::Revenue).await.unwrap(),
            Money::from_minor(10_000)
        );
        assert!(ctx.has_shared(SHARED_RECEIPT_PAIR));
    }

    #[tokio::test]
    async fn receipt_compensation_restores_balances() {
        let ledger = ledger();
        let op = RecordLedgerReceipt::new(ledger.clone());
        let mut ctx = context(&[
            (META_PAYMENT_ID, json!("pay-1")),
            (META_PAYMENT_AMOUNT_MINOR, json!(10_000)),
        ]);

        op.execute(&mut ctx).await.unwrap();
        op.compensate(&ctx).await.unwrap();

        assert_eq!(
            ledger.get_account_balance(Account::Cash).await.unwrap(),
            Money::zero()
        );
        assert_eq!(
            ledger.get_account_balance(Account::Revenue).await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn zero_discount_skips_the_liability() {
        let ledger = ledger();
        let op = RecordLedgerLiability::campaign(ledger.clone());
        let mut ctx = context(&[(META_CAMPAIGN_ID, json!("camp-1"))]);
        ctx.set_shared(SHARED_DISCOUNT_MINOR, json!(0));

        let result = op.execute(&mut ctx).await.unwrap();
        assert_eq!(result.data.unwrap()["skipped"], true);
        assert!(!ctx.has_shared(SHARED_LIABILITY_PAIR));

        // Compensating a skipped step writes nothing.
        op.compensate(&ctx).await.unwrap();
        assert_eq!(
            ledger
                .get_account_balance(Account::Liabilities)
                .await
                .unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn referral_liability_uses_bonus_metadata() {
        let ledger = ledger();
        let op = RecordLedgerLiability::referral(ledger.clone());
        let mut ctx = context(&[
            (META_REFERRAL_ID, json!("ref-1")),
            (META_BONUS_MINOR, json!(500)),
        ]);

        op.execute(&mut ctx).await.unwrap();
        assert_eq!(
            ledger
                .get_account_balance(Account::Liabilities)
                .await
                .unwrap(),
            Money::from_minor(500)
        );
        assert_eq!(
            ledger.get_account_balance(Account::Expenses).await.unwrap(),
            Money::from_minor(500)
        );
    }

    #[tokio::test]
    async fn cashout_records_net_of_withholding() {
        let ledger = ledger();
        // Seed books: cash and a matching liability to pay down.
        ledger
            .record_double_entry(Posting::new(
                Account::Cash,
                Account::Liabilities,
                Money::from_minor(10_000),
                ReferenceType::Payment,
                "seed",
                "seed balances",
            ))
            .await
            .unwrap();

        let op = RecordLedgerCashout::new(ledger.clone());
        let mut ctx = context(&[
            (META_WITHDRAWAL_ID, json!("wd-1")),
            (META_AMOUNT_MINOR, json!(5_000)),
        ]);
        ctx.set_shared(SHARED_WITHHOLDING_TAX_MINOR, json!(500));

        let result = op.execute(&mut ctx).await.unwrap();
        assert_eq!(result.data.unwrap()["amount_minor"], 4_500);
        assert_eq!(
            ledger.get_account_balance(Account::Cash).await.unwrap(),
            Money::from_minor(5_500)
        );
    }

    #[tokio::test]
    async fn cashout_netting_to_zero_is_rejected() {
        let op = RecordLedgerCashout::new(ledger());
        let mut ctx = context(&[
            (META_WITHDRAWAL_ID, json!("wd-1")),
            (META_AMOUNT_MINOR, json!(500)),
        ]);
        ctx.set_shared(SHARED_WITHHOLDING_TAX_MINOR, json!(500));

        assert!(matches!(
            op.execute(&mut ctx).await,
            Err(OperationError::Validation(_))
        ));
    }
}

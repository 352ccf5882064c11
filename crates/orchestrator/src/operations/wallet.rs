use std::sync::Arc;

use async_trait::async_trait;
use common::Money;
use saga::{Operation, OperationError, SagaContext, StepResult};
use serde_json::json;

use crate::operations::{require_amount, require_str, require_user};
use crate::services::WalletService;

/// Credits a user's wallet; compensation debits the same amount back.
pub struct CreditWallet {
    wallet: Arc<dyn WalletService>,
    user_key: &'static str,
    amount_key: &'static str,
    reference_key: &'static str,
    reason: &'static str,
}

impl CreditWallet {
    pub fn new(
        wallet: Arc<dyn WalletService>,
        user_key: &'static str,
        amount_key: &'static str,
        reference_key: &'static str,
        reason: &'static str,
    ) -> Self {
        Self {
            wallet,
            user_key,
            amount_key,
            reference_key,
            reason,
        }
    }
}

#[async_trait]
impl Operation for CreditWallet {
    fn name(&self) -> &str {
        "credit_wallet"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let user = require_user(ctx, self.user_key)?;
        let amount = require_amount(ctx, self.amount_key)?;
        let reference = require_str(ctx, self.reference_key)?;

        self.wallet
            .credit(user, amount, self.reason, reference)
            .await?;
        Ok(StepResult::with_data(json!({
            "user_id": user.to_string(),
            "credited_minor": amount.minor(),
        })))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        let user = require_user(ctx, self.user_key)?;
        let amount = require_amount(ctx, self.amount_key)?;
        let reference = require_str(ctx, self.reference_key)?;

        self.wallet
            .debit(user, amount, "reversal of wallet credit", reference)
            .await
    }
}

/// Debits a user's wallet, optionally net of a discount computed by an
/// earlier step; compensation credits the same effective amount back.
pub struct DebitWallet {
    wallet: Arc<dyn WalletService>,
    user_key: &'static str,
    amount_key: &'static str,
    discount_shared_key: Option<&'static str>,
    reference_key: &'static str,
    reason: &'static str,
}

impl DebitWallet {
    pub fn new(
        wallet: Arc<dyn WalletService>,
        user_key: &'static str,
        amount_key: &'static str,
        discount_shared_key: Option<&'static str>,
        reference_key: &'static str,
        reason: &'static str,
    ) -> Self {
        Self {
            wallet,
            user_key,
            amount_key,
            discount_shared_key,
            reference_key,
            reason,
        }
    }

    /// The amount actually debited: the metadata amount less any shared
    /// discount. Deterministic for a given context, so compensate
    /// recomputes it instead of persisting it.
    fn effective_amount(&self, ctx: &SagaContext) -> Result<Money, OperationError> {
        let gross = require_amount(ctx, self.amount_key)?;
        let discount = match self.discount_shared_key {
            Some(key) => Money::from_minor(ctx.shared_i64(key).unwrap_or(0)),
            None => Money::zero(),
        };
        Ok(gross - discount)
    }
}

#[async_trait]
impl Operation for DebitWallet {
    fn name(&self) -> &str {
        "debit_wallet"
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<StepResult, OperationError> {
        let user = require_user(ctx, self.user_key)?;
        let amount = self.effective_amount(ctx)?;
        let reference = require_str(ctx, self.reference_key)?;

        self.wallet
            .debit(user, amount, self.reason, reference)
            .await?;
        Ok(StepResult::with_data(json!({
            "user_id": user.to_string(),
            "debited_minor": amount.minor(),
        })))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), OperationError> {
        let user = require_user(ctx, self.user_key)?;
        let amount = self.effective_amount(ctx)?;
        let reference = require_str(ctx, self.reference_key)?;

        self.wallet
            .credit(user, amount, "reversal of wallet debit", reference)
            .await
    }
}

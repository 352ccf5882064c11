//! The financial orchestrator: named flows assembled from operations
//! and handed to the saga coordinator.

use std::collections::HashMap;
use std::sync::Arc;

use ledger::{Ledger, SolvencyReport};
use saga::{
    Operation, SagaContext, SagaCoordinator, SagaError, SagaExecution, SagaRepository, SagaStep,
};
use common::SagaId;
use serde_json::{Value, json};

use crate::error::Result;
use crate::flows::{
    FLOW_PAYMENT_TO_INVESTMENT, FLOW_REFERRAL_BONUS, FLOW_WITHDRAWAL, META_AMOUNT_MINOR,
    META_BONUS_MINOR, META_CAMPAIGN_DISCOUNT_MINOR, META_CAMPAIGN_ID, META_FLOW,
    META_INVESTMENT_AMOUNT_MINOR, META_INVESTMENT_ID, META_PAYMENT_AMOUNT_MINOR, META_PAYMENT_ID,
    META_REFEREE_ID, META_REFERRAL_ID, META_REFERRER_ID, META_USER_ID, META_WITHDRAWAL_ID,
    SHARED_DISCOUNT_MINOR,
};
use crate::operations::{
    AllocateInventory, CalculateCampaignBenefit, CalculateWithholdingTax, CallExternalTransfer,
    CreditWallet, DebitWallet, MarkEntityComplete, RecordLedgerCashout, RecordLedgerLiability,
    RecordLedgerReceipt, VerifyAdminSolvency, VerifyCompliance,
};
use crate::provenance::{ProvenanceEntry, ProvenanceTrail};
use crate::requests::{
    CampaignRequest, InvestmentRequest, PaymentRequest, ReferralRequest, WithdrawalRequest,
};
use crate::result::FlowResult;
use crate::services::{
    AllocationService, ComplianceService, OperationKind, ReconciliationReport,
    ReconciliationService, StatusService, TaxService, TransferService, WalletService,
};

/// The external collaborators the flows' operations call.
#[derive(Clone)]
pub struct Collaborators {
    pub wallet: Arc<dyn WalletService>,
    pub compliance: Arc<dyn ComplianceService>,
    pub allocation: Arc<dyn AllocationService>,
    pub transfer: Arc<dyn TransferService>,
    pub tax: Arc<dyn TaxService>,
    pub status: Arc<dyn StatusService>,
    pub reconciliation: Arc<dyn ReconciliationService>,
}

/// Entry point for the three orchestrated money flows.
///
/// Each `execute_*` method persists a fresh saga execution, assembles
/// the flow's fixed operation list, and runs it through the
/// coordinator. A step failure comes back as a structured
/// [`FlowResult::Failed`] after compensation has run; errors in the
/// machinery itself (storage, invalid status) propagate as
/// [`crate::OrchestratorError`].
pub struct FinancialOrchestrator<R: SagaRepository> {
    coordinator: SagaCoordinator<R>,
    ledger: Ledger,
    collaborators: Collaborators,
}

impl<R: SagaRepository> FinancialOrchestrator<R> {
    /// Creates an orchestrator over a saga repository, the ledger, and
    /// the collaborator set.
    pub fn new(repository: R, ledger: Ledger, collaborators: Collaborators) -> Self {
        Self {
            coordinator: SagaCoordinator::new(repository),
            ledger,
            collaborators,
        }
    }

    /// The ledger the flows post to.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Payment → investment: credit the user's wallet with the payment,
    /// record the receipt, buy the investment net of any campaign
    /// discount, accrue the discount liability, and allocate inventory.
    #[tracing::instrument(skip(self, payment, investment, campaign), fields(payment_id = %payment.payment_id, investment_id = %investment.investment_id))]
    pub async fn execute_payment_to_investment(
        &self,
        payment: PaymentRequest,
        investment: InvestmentRequest,
        campaign: Option<CampaignRequest>,
    ) -> Result<FlowResult> {
        let mut metadata = HashMap::from([
            (META_FLOW.to_string(), json!(FLOW_PAYMENT_TO_INVESTMENT)),
            (META_USER_ID.to_string(), json!(payment.user_id.to_string())),
            (META_PAYMENT_ID.to_string(), json!(payment.payment_id)),
            (
                META_PAYMENT_AMOUNT_MINOR.to_string(),
                json!(payment.amount.minor()),
            ),
            (
                META_INVESTMENT_ID.to_string(),
                json!(investment.investment_id),
            ),
            (
                META_INVESTMENT_AMOUNT_MINOR.to_string(),
                json!(investment.amount.minor()),
            ),
        ]);
        if let Some(campaign) = campaign {
            metadata.insert(META_CAMPAIGN_ID.to_string(), json!(campaign.campaign_id));
            metadata.insert(
                META_CAMPAIGN_DISCOUNT_MINOR.to_string(),
                json!(campaign.discount.minor()),
            );
        }

        let operations: Vec<Box<dyn Operation>> = vec![
            Box::new(VerifyCompliance::new(
                self.collaborators.compliance.clone(),
                OperationKind::Investment,
                META_USER_ID,
                META_PAYMENT_AMOUNT_MINOR,
            )),
            Box::new(CalculateCampaignBenefit),
            Box::new(CreditWallet::new(
                self.collaborators.wallet.clone(),
                META_USER_ID,
                META_PAYMENT_AMOUNT_MINOR,
                META_PAYMENT_ID,
                "payment received",
            )),
            Box::new(RecordLedgerReceipt::new(self.ledger.clone())),
            Box::new(DebitWallet::new(
                self.collaborators.wallet.clone(),
                META_USER_ID,
                META_INVESTMENT_AMOUNT_MINOR,
                Some(SHARED_DISCOUNT_MINOR),
                META_INVESTMENT_ID,
                "investment purchase",
            )),
            Box::new(RecordLedgerLiability::campaign(self.ledger.clone())),
            Box::new(AllocateInventory::new(
                self.collaborators.allocation.clone(),
            )),
            Box::new(MarkEntityComplete::new(
                self.collaborators.status.clone(),
                "investment",
                META_INVESTMENT_ID,
            )),
        ];

        self.run_flow(FLOW_PAYMENT_TO_INVESTMENT, metadata, operations)
            .await
    }

    /// Referral bonus: accrue the bonus liability on the books first,
    /// then pay the referrer's wallet and complete the referral.
    #[tracing::instrument(skip(self, referral), fields(referral_id = %referral.referral_id))]
    pub async fn execute_referral_bonus(&self, referral: ReferralRequest) -> Result<FlowResult> {
        let metadata = HashMap::from([
            (META_FLOW.to_string(), json!(FLOW_REFERRAL_BONUS)),
            (META_REFERRAL_ID.to_string(), json!(referral.referral_id)),
            (
                META_REFERRER_ID.to_string(),
                json!(referral.referrer_id.to_string()),
            ),
            (
                META_REFEREE_ID.to_string(),
                json!(referral.referee_id.to_string()),
            ),
            (META_BONUS_MINOR.to_string(), json!(referral.bonus.minor())),
        ]);

        let operations: Vec<Box<dyn Operation>> = vec![
            Box::new(VerifyCompliance::new(
                self.collaborators.compliance.clone(),
                OperationKind::Referral,
                META_REFERRER_ID,
                META_BONUS_MINOR,
            )),
            Box::new(RecordLedgerLiability::referral(self.ledger.clone())),
            Box::new(CreditWallet::new(
                self.collaborators.wallet.clone(),
                META_REFERRER_ID,
                META_BONUS_MINOR,
                META_REFERRAL_ID,
                "referral bonus payout",
            )),
            Box::new(MarkEntityComplete::new(
                self.collaborators.status.clone(),
                "referral",
                META_REFERRAL_ID,
            )),
        ];

        self.run_flow(FLOW_REFERRAL_BONUS, metadata, operations)
            .await
    }

    /// Withdrawal: gate on operator solvency, withhold tax, debit the
    /// wallet for the gross amount, record the net cashout, and pay out
    /// through the external provider.
    #[tracing::instrument(skip(self, withdrawal), fields(withdrawal_id = %withdrawal.withdrawal_id))]
    pub async fn execute_withdrawal(&self, withdrawal: WithdrawalRequest) -> Result<FlowResult> {
        let metadata = HashMap::from([
            (META_FLOW.to_string(), json!(FLOW_WITHDRAWAL)),
            (
                META_USER_ID.to_string(),
                json!(withdrawal.user_id.to_string()),
            ),
            (
                META_WITHDRAWAL_ID.to_string(),
                json!(withdrawal.withdrawal_id),
            ),
            (
                META_AMOUNT_MINOR.to_string(),
                json!(withdrawal.amount.minor()),
            ),
        ]);

        let operations: Vec<Box<dyn Operation>> = vec![
            Box::new(VerifyCompliance::new(
                self.collaborators.compliance.clone(),
                OperationKind::Withdrawal,
                META_USER_ID,
                META_AMOUNT_MINOR,
            )),
            Box::new(VerifyAdminSolvency::new(self.ledger.clone())),
            Box::new(CalculateWithholdingTax::new(self.collaborators.tax.clone())),
            Box::new(DebitWallet::new(
                self.collaborators.wallet.clone(),
                META_USER_ID,
                META_AMOUNT_MINOR,
                None,
                META_WITHDRAWAL_ID,
                "withdrawal",
            )),
            Box::new(RecordLedgerCashout::new(self.ledger.clone())),
            Box::new(CallExternalTransfer::new(
                self.collaborators.transfer.clone(),
            )),
            Box::new(MarkEntityComplete::new(
                self.collaborators.status.clone(),
                "withdrawal",
                META_WITHDRAWAL_ID,
            )),
        ];

        self.run_flow(FLOW_WITHDRAWAL, metadata, operations).await
    }

    /// Current books-level solvency report.
    pub async fn verify_admin_solvency(&self) -> Result<SolvencyReport> {
        Ok(self.ledger.calculate_solvency().await?)
    }

    /// Every saga that touched the given business entity, newest first,
    /// looked up by the `{entity_type}_id` metadata key.
    pub async fn get_provenance(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<ProvenanceTrail> {
        let key = format!("{entity_type}_id");
        let value = json!(entity_id);

        let executions = self
            .coordinator
            .repository()
            .find_by_metadata(&key, &value)
            .await?;

        let mut sagas = Vec::with_capacity(executions.len());
        for execution in executions {
            let steps = self
                .coordinator
                .repository()
                .get_steps(execution.saga_id)
                .await?;
            sagas.push(ProvenanceEntry { execution, steps });
        }

        Ok(ProvenanceTrail {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            sagas,
        })
    }

    /// Records an operator's manual resolution of a stuck saga.
    pub async fn resume_saga(
        &self,
        saga_id: SagaId,
        resolved_by: &str,
        resolution_data: Value,
    ) -> Result<SagaExecution> {
        Ok(self
            .coordinator
            .resume_saga(saga_id, resolved_by, resolution_data)
            .await?)
    }

    /// Loads a saga execution record.
    pub async fn get_execution(&self, saga_id: SagaId) -> Result<Option<SagaExecution>> {
        Ok(self.coordinator.get_execution(saga_id).await?)
    }

    /// Loads a saga's step records in execution order.
    pub async fn get_steps(&self, saga_id: SagaId) -> Result<Vec<SagaStep>> {
        Ok(self.coordinator.get_steps(saga_id).await?)
    }

    /// Runs the out-of-core reconciliation collaborator.
    pub async fn reconcile(&self) -> Result<ReconciliationReport> {
        Ok(self.collaborators.reconciliation.reconcile().await?)
    }

    async fn run_flow(
        &self,
        flow: &'static str,
        metadata: HashMap<String, Value>,
        operations: Vec<Box<dyn Operation>>,
    ) -> Result<FlowResult> {
        metrics::counter!("orchestrator_flows_total", "flow" => flow).increment(1);

        let execution = SagaExecution::new(metadata.clone());
        let saga_id = execution.saga_id;
        self.coordinator
            .repository()
            .create_execution(&execution)
            .await?;

        let mut ctx = SagaContext::new(saga_id, metadata);
        match self.coordinator.execute(&mut ctx, &operations).await {
            Ok(outcome) => {
                tracing::info!(%saga_id, flow, steps = outcome.steps_executed, "flow completed");
                Ok(FlowResult::Success {
                    saga_id,
                    steps_executed: outcome.steps_executed,
                })
            }
            Err(err @ SagaError::Step { .. }) => {
                metrics::counter!("orchestrator_flow_failures_total", "flow" => flow).increment(1);
                tracing::warn!(%saga_id, flow, error = %err, "flow failed and was compensated");
                Ok(FlowResult::Failed {
                    saga_id,
                    compensated: true,
                    message: err.to_string(),
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}

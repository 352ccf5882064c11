//! Financial orchestrator: named business flows over the saga core.
//!
//! Each flow (payment → investment, referral bonus, withdrawal) is a
//! fixed, ordered list of operations built here and handed to the saga
//! coordinator. Operations wrap the external collaborators (wallet,
//! compliance, allocation, transfer, tax) and the double-entry ledger;
//! on any step failure the coordinator compensates completed steps in
//! reverse, so callers only ever see whole success or whole
//! failure-with-compensation.

pub mod error;
pub mod flows;
pub mod operations;
pub mod orchestrator;
pub mod provenance;
pub mod requests;
pub mod result;
pub mod services;

pub use error::{OrchestratorError, Result};
pub use orchestrator::{Collaborators, FinancialOrchestrator};
pub use provenance::{ProvenanceEntry, ProvenanceTrail};
pub use requests::{
    CampaignRequest, InvestmentRequest, PaymentRequest, ReferralRequest, WithdrawalRequest,
};
pub use result::FlowResult;
pub use services::{
    Allocation, AllocationService, ComplianceService, FlatRateTaxService,
    InMemoryAllocationService, InMemoryComplianceService, InMemoryReconciliationService,
    InMemoryStatusService, InMemoryTransferService, InMemoryWalletService, OperationKind,
    ReconciliationReport, ReconciliationService, StatusService, TaxService, TransferAck,
    TransferService, WalletService,
};

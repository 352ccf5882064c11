//! External collaborator traits and in-memory implementations.
//!
//! The core treats wallets, compliance, allocation, transfers, tax and
//! reconciliation as abstract capabilities. Each operation's effect is
//! atomic on the collaborator's side and safe to compensate; the
//! in-memory implementations exist for tests and mirror that contract,
//! with `set_fail_on_*` switches to force failures at chosen steps.

pub mod allocation;
pub mod compliance;
pub mod reconciliation;
pub mod status;
pub mod tax;
pub mod transfer;
pub mod wallet;

pub use allocation::{Allocation, AllocationService, InMemoryAllocationService};
pub use compliance::{ComplianceService, InMemoryComplianceService, OperationKind};
pub use reconciliation::{
    InMemoryReconciliationService, ReconciliationReport, ReconciliationService,
};
pub use status::{InMemoryStatusService, StatusService};
pub use tax::{FlatRateTaxService, TaxService};
pub use transfer::{InMemoryTransferService, TransferAck, TransferService};
pub use wallet::{InMemoryWalletService, WalletService};

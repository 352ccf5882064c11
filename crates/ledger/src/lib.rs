//! Append-only double-entry ledger.
//!
//! Every economic event is recorded as a balanced pair of entries (one
//! debit, one credit, equal amounts). Balances are derived from the
//! journal and never stored mutably, so a balance field can never drift
//! from the entries that produced it. The accounting identity
//! `assets == liabilities + equity` therefore holds by construction, and
//! [`Ledger::calculate_solvency`] surfaces any discrepancy as a defect
//! rather than silently absorbing it.

pub mod account;
pub mod entry;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod solvency;
pub mod store;

pub use account::{Account, ReferenceType, Side};
pub use entry::{EntryPair, LedgerEntry, Posting};
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use query::EntryQuery;
pub use solvency::SolvencyReport;
pub use store::LedgerStore;

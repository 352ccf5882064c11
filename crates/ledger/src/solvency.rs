//! Solvency reporting over derived account balances.

use std::collections::BTreeMap;

use common::Money;
use serde::{Deserialize, Serialize};

use crate::account::Account;

/// Allowed rounding slack, in minor units, on the accounting identity.
pub const IDENTITY_TOLERANCE_MINOR: i64 = 1;

/// A point-in-time view of the operator's books.
///
/// `assets == liabilities + equity` must hold within one minor unit; a
/// larger `discrepancy` signals a defect in the double-entry discipline
/// itself and is surfaced loudly by the ledger, never ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvencyReport {
    /// Cash account balance.
    pub cash: Money,
    /// Inventory account balance.
    pub inventory: Money,
    /// Liabilities account balance.
    pub liabilities: Money,
    /// Revenue account balance.
    pub revenue: Money,
    /// Expenses account balance.
    pub expenses: Money,
    /// `cash - liabilities`.
    pub net_position: Money,
    /// `revenue - expenses`.
    pub equity: Money,
    /// `cash + inventory`.
    pub assets: Money,
    /// True when cash covers recorded liabilities.
    pub is_solvent: bool,
    /// Raw per-account balances, keyed by account.
    pub accounting_balances: BTreeMap<Account, Money>,
    /// `assets - (liabilities + equity)`; zero on healthy books.
    pub discrepancy: Money,
}

impl SolvencyReport {
    /// Derives a report from the five account balances.
    pub fn from_balances(balances: &BTreeMap<Account, Money>) -> Self {
        let balance = |account: Account| balances.get(&account).copied().unwrap_or_default();

        let cash = balance(Account::Cash);
        let inventory = balance(Account::Inventory);
        let liabilities = balance(Account::Liabilities);
        let revenue = balance(Account::Revenue);
        let expenses = balance(Account::Expenses);

        let net_position = cash - liabilities;
        let equity = revenue - expenses;
        let assets = cash + inventory;
        let discrepancy = assets - (liabilities + equity);

        Self {
            cash,
            inventory,
            liabilities,
            revenue,
            expenses,
            net_position,
            equity,
            assets,
            is_solvent: cash >= liabilities,
            accounting_balances: balances.clone(),
            discrepancy,
        }
    }

    /// True when the accounting identity holds within tolerance.
    pub fn is_balanced(&self) -> bool {
        self.discrepancy.abs().minor() <= IDENTITY_TOLERANCE_MINOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(entries: &[(Account, i64)]) -> BTreeMap<Account, Money> {
        entries
            .iter()
            .map(|(account, minor)| (*account, Money::from_minor(*minor)))
            .collect()
    }

    #[test]
    fn empty_books_are_balanced_and_solvent() {
        let report = SolvencyReport::from_balances(&BTreeMap::new());
        assert!(report.is_balanced());
        assert!(report.is_solvent);
        assert_eq!(report.assets, Money::zero());
        assert_eq!(report.net_position, Money::zero());
    }

    #[test]
    fn identity_holds_after_receipt_and_purchase() {
        // Receipt of 10,000 then inventory purchase of 7,000.
        let report = SolvencyReport::from_balances(&balances(&[
            (Account::Cash, 3_000),
            (Account::Inventory, 7_000),
            (Account::Revenue, 10_000),
        ]));

        assert_eq!(report.assets.minor(), 10_000);
        assert_eq!(report.equity.minor(), 10_000);
        assert_eq!(report.net_position.minor(), 3_000);
        assert!(report.is_balanced());
        assert!(report.is_solvent);
    }

    #[test]
    fn discrepancy_is_surfaced() {
        // A lone debit with no matching credit breaks the identity.
        let report = SolvencyReport::from_balances(&balances(&[(Account::Cash, 5_000)]));
        assert_eq!(report.discrepancy.minor(), 5_000);
        assert!(!report.is_balanced());
    }

    #[test]
    fn insolvent_when_liabilities_exceed_cash() {
        let report = SolvencyReport::from_balances(&balances(&[
            (Account::Cash, 1_000),
            (Account::Liabilities, 2_000),
            (Account::Expenses, 1_000),
        ]));
        assert!(!report.is_solvent);
        assert_eq!(report.net_position.minor(), -1_000);
        assert!(report.is_balanced());
    }
}

//! High-level ledger facade.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::Money;

use crate::{
    Account, EntryPair, EntryQuery, LedgerEntry, LedgerError, Posting, Result, SolvencyReport,
    store::LedgerStore,
};

/// The double-entry ledger: validation, metrics and solvency reporting
/// over a [`LedgerStore`].
///
/// Cheap to clone; all clones share the same journal.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
}

impl Ledger {
    /// Creates a ledger over the given store.
    pub fn new(store: impl LedgerStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Records a balanced pair of entries for the posting.
    ///
    /// The amount must be strictly positive and the two accounts must
    /// differ. Both entries are created in one atomic unit; partial pair
    /// creation is never observable.
    #[tracing::instrument(skip(self), fields(
        debit = %posting.debit_account,
        credit = %posting.credit_account,
        amount = %posting.amount_minor,
    ))]
    pub async fn record_double_entry(&self, posting: Posting) -> Result<EntryPair> {
        if !posting.amount_minor.is_positive() {
            return Err(LedgerError::InvalidAmount(posting.amount_minor));
        }
        if posting.debit_account == posting.credit_account {
            return Err(LedgerError::SameAccount(posting.debit_account));
        }

        let pair = self.store.record_pair(&posting).await?;
        metrics::counter!("ledger_entries_total").increment(2);
        tracing::debug!(
            debit_entry = %pair.debit.id,
            credit_entry = %pair.credit.id,
            reference = %posting.reference_id,
            "recorded double entry"
        );

        Ok(pair)
    }

    /// Returns the account's current balance in minor units.
    pub async fn get_account_balance(&self, account: Account) -> Result<Money> {
        self.store.account_balance(account).await
    }

    /// Pre-flight gate: does the cash account cover the required amount?
    pub async fn has_sufficient_cash(&self, required: Money) -> Result<bool> {
        let cash = self.store.account_balance(Account::Cash).await?;
        Ok(cash >= required)
    }

    /// Computes the solvency report from the five derived balances.
    ///
    /// An accounting identity discrepancy beyond the rounding tolerance
    /// means the double-entry discipline itself is broken; it is logged
    /// at error level and counted, and carried in the report for the
    /// caller to surface.
    #[tracing::instrument(skip(self))]
    pub async fn calculate_solvency(&self) -> Result<SolvencyReport> {
        let mut balances = BTreeMap::new();
        for account in Account::ALL {
            balances.insert(account, self.store.account_balance(account).await?);
        }

        let report = SolvencyReport::from_balances(&balances);
        if !report.is_balanced() {
            metrics::counter!("ledger_identity_violations_total").increment(1);
            tracing::error!(
                discrepancy = %report.discrepancy,
                assets = %report.assets,
                liabilities = %report.liabilities,
                equity = %report.equity,
                "accounting identity violated"
            );
        }

        Ok(report)
    }

    /// Read-only audit query over the journal, newest first.
    pub async fn get_entries(&self, query: EntryQuery) -> Result<Vec<LedgerEntry>> {
        self.store.entries(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::ReferenceType;
    use crate::memory::InMemoryLedgerStore;

    fn ledger() -> Ledger {
        Ledger::new(InMemoryLedgerStore::new())
    }

    fn receipt(amount: i64) -> Posting {
        Posting::new(
            Account::Cash,
            Account::Revenue,
            Money::from_minor(amount),
            ReferenceType::Payment,
            "42",
            "payment receipt",
        )
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts() {
        let ledger = ledger();

        let zero = ledger.record_double_entry(receipt(0)).await;
        assert!(matches!(zero, Err(LedgerError::InvalidAmount(_))));

        let negative = ledger.record_double_entry(receipt(-100)).await;
        assert!(matches!(negative, Err(LedgerError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn rejects_same_account_posting() {
        let ledger = ledger();
        let posting = Posting::new(
            Account::Cash,
            Account::Cash,
            Money::from_minor(100),
            ReferenceType::Payment,
            "42",
            "nonsense",
        );
        let result = ledger.record_double_entry(posting).await;
        assert!(matches!(result, Err(LedgerError::SameAccount(_))));
    }

    #[tokio::test]
    async fn scenario_receipt_then_inventory_purchase() {
        let ledger = ledger();

        ledger.record_double_entry(receipt(10_000)).await.unwrap();
        ledger
            .record_double_entry(Posting::new(
                Account::Inventory,
                Account::Cash,
                Money::from_minor(7_000),
                ReferenceType::BulkPurchase,
                "7",
                "stock purchase",
            ))
            .await
            .unwrap();

        assert_eq!(
            ledger
                .get_account_balance(Account::Cash)
                .await
                .unwrap()
                .minor(),
            3_000
        );
        assert_eq!(
            ledger
                .get_account_balance(Account::Inventory)
                .await
                .unwrap()
                .minor(),
            7_000
        );
        assert_eq!(
            ledger
                .get_account_balance(Account::Revenue)
                .await
                .unwrap()
                .minor(),
            10_000
        );

        let report = ledger.calculate_solvency().await.unwrap();
        assert!(report.is_balanced());
        assert!(report.is_solvent);
        assert_eq!(report.net_position.minor(), 3_000);
    }

    #[tokio::test]
    async fn has_sufficient_cash_gate() {
        let ledger = ledger();
        ledger.record_double_entry(receipt(10_000)).await.unwrap();
        ledger
            .record_double_entry(Posting::new(
                Account::Inventory,
                Account::Cash,
                Money::from_minor(7_000),
                ReferenceType::BulkPurchase,
                "7",
                "stock purchase",
            ))
            .await
            .unwrap();

        assert!(!ledger
            .has_sufficient_cash(Money::from_minor(5_000))
            .await
            .unwrap());
        assert!(ledger
            .has_sufficient_cash(Money::from_minor(3_000))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn pairing_invariant_holds() {
        let ledger = ledger();
        ledger.record_double_entry(receipt(10_000)).await.unwrap();
        ledger.record_double_entry(receipt(2_500)).await.unwrap();

        let entries = ledger.get_entries(EntryQuery::new()).await.unwrap();
        assert_eq!(entries.len(), 4);

        for entry in &entries {
            let paired_id = entry.paired_entry_id.expect("entry must be paired");
            let paired = entries
                .iter()
                .find(|e| e.id == paired_id)
                .expect("paired entry must exist");
            assert_eq!(paired.amount_minor, entry.amount_minor);
            assert_eq!(paired.side, entry.side.opposite());
            assert_eq!(paired.paired_entry_id, Some(entry.id));
        }
    }

    #[tokio::test]
    async fn reversal_restores_balances() {
        let ledger = ledger();
        let pair = ledger.record_double_entry(receipt(10_000)).await.unwrap();

        ledger
            .record_double_entry(Posting::reversal_of(&pair, "undo payment receipt"))
            .await
            .unwrap();

        assert_eq!(
            ledger.get_account_balance(Account::Cash).await.unwrap(),
            Money::zero()
        );
        assert_eq!(
            ledger.get_account_balance(Account::Revenue).await.unwrap(),
            Money::zero()
        );

        let report = ledger.calculate_solvency().await.unwrap();
        assert!(report.is_balanced());
    }
}

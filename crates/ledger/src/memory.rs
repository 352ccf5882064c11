use std::sync::Arc;

use async_trait::async_trait;
use common::Money;
use tokio::sync::RwLock;

use crate::{
    Account, EntryPair, EntryQuery, LedgerEntry, Posting, Result,
    entry::build_pair,
    store::LedgerStore,
};

/// In-memory journal for testing.
///
/// A single write lock over the journal serializes all writers, which
/// trivially satisfies the per-account serialization contract. Provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl InMemoryLedgerStore {
    /// Creates a new empty in-memory journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of entries stored.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Clears the journal.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    fn latest_balance(entries: &[LedgerEntry], account: Account) -> Money {
        entries
            .iter()
            .rev()
            .find(|e| e.account == account)
            .map(|e| e.balance_after_minor)
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn record_pair(&self, posting: &Posting) -> Result<EntryPair> {
        let mut entries = self.entries.write().await;

        let debit_before = Self::latest_balance(&entries, posting.debit_account);
        let credit_before = Self::latest_balance(&entries, posting.credit_account);

        let pair = build_pair(posting, debit_before, credit_before);
        entries.push(pair.debit.clone());
        entries.push(pair.credit.clone());

        Ok(pair)
    }

    async fn account_balance(&self, account: Account) -> Result<Money> {
        let entries = self.entries.read().await;
        Ok(Self::latest_balance(&entries, account))
    }

    async fn entries(&self, query: &EntryQuery) -> Result<Vec<LedgerEntry>> {
        let entries = self.entries.read().await;

        // Insertion order is creation order; iterate backwards for
        // newest first.
        let mut matched: Vec<LedgerEntry> = entries
            .iter()
            .rev()
            .filter(|e| {
                if let Some(account) = query.account
                    && e.account != account
                {
                    return false;
                }
                if let Some(reference_type) = query.reference_type
                    && e.reference_type != reference_type
                {
                    return false;
                }
                if let Some(ref reference_id) = query.reference_id
                    && &e.reference_id != reference_id
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }
}

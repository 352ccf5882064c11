use async_trait::async_trait;
use common::Money;

use crate::{Account, EntryPair, EntryQuery, LedgerEntry, Posting, Result};

/// Storage contract for the append-only journal.
///
/// Implementations own the atomicity boundary: `record_pair` creates
/// both sides of a posting in one atomic unit, and serializes concurrent
/// writers per account so each account's balance chain has no gaps.
/// Validation of posting amounts happens above, in [`crate::Ledger`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Atomically appends both entries of the posting.
    ///
    /// Reads each account's current balance as the `balance_after_minor`
    /// of its latest entry (zero if the account has none) while holding
    /// that account's writer serialization, then appends the debit entry
    /// and its paired credit entry. Partial pair creation is never
    /// observable.
    async fn record_pair(&self, posting: &Posting) -> Result<EntryPair>;

    /// Returns the account's current balance: the latest entry's
    /// `balance_after_minor`, or zero if the account has no entries.
    async fn account_balance(&self, account: Account) -> Result<Money>;

    /// Returns entries matching the query, newest first.
    async fn entries(&self, query: &EntryQuery) -> Result<Vec<LedgerEntry>>;
}

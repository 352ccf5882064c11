//! Ledger entries and postings.

use chrono::{DateTime, Utc};
use common::{EntryId, Money};
use serde::{Deserialize, Serialize};

use crate::account::{Account, ReferenceType, Side};

/// One immutable row of the journal: a single side of a posting.
///
/// Entries are never updated or deleted. Every entry has exactly one
/// paired entry of the opposite side with the same amount, linked via
/// `paired_entry_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry identifier.
    pub id: EntryId,
    /// The account this entry belongs to.
    pub account: Account,
    /// Debit or credit.
    pub side: Side,
    /// Posting amount in minor units, strictly positive.
    pub amount_minor: Money,
    /// The account's balance before this entry.
    pub balance_before_minor: Money,
    /// The account's balance after this entry.
    pub balance_after_minor: Money,
    /// The business entity kind that caused this entry.
    pub reference_type: ReferenceType,
    /// The business entity identifier.
    pub reference_id: String,
    /// Human-readable note.
    pub description: String,
    /// The opposite side of this posting.
    pub paired_entry_id: Option<EntryId>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// The two sides of a recorded posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPair {
    /// The debit-side entry.
    pub debit: LedgerEntry,
    /// The credit-side entry.
    pub credit: LedgerEntry,
}

impl EntryPair {
    /// The posting amount (identical on both sides).
    pub fn amount(&self) -> Money {
        self.debit.amount_minor
    }
}

/// A balanced posting to be recorded: one debit account, one credit
/// account, one amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// The account debited.
    pub debit_account: Account,
    /// The account credited.
    pub credit_account: Account,
    /// Posting amount in minor units.
    pub amount_minor: Money,
    /// The business entity kind causing the posting.
    pub reference_type: ReferenceType,
    /// The business entity identifier.
    pub reference_id: String,
    /// Human-readable note recorded on both entries.
    pub description: String,
}

impl Posting {
    /// Creates a new posting.
    pub fn new(
        debit_account: Account,
        credit_account: Account,
        amount_minor: Money,
        reference_type: ReferenceType,
        reference_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            debit_account,
            credit_account,
            amount_minor,
            reference_type,
            reference_id: reference_id.into(),
            description: description.into(),
        }
    }

    /// Builds the posting that undoes a previously recorded pair.
    ///
    /// The journal is append-only, so compensation appends a reversal
    /// with the debit and credit accounts swapped rather than deleting
    /// the original entries.
    pub fn reversal_of(pair: &EntryPair, description: impl Into<String>) -> Self {
        Self {
            debit_account: pair.credit.account,
            credit_account: pair.debit.account,
            amount_minor: pair.amount(),
            reference_type: pair.debit.reference_type,
            reference_id: pair.debit.reference_id.clone(),
            description: description.into(),
        }
    }
}

/// Materializes the two entries of a posting given each account's
/// current balance.
///
/// Stores call this after serializing writers on the two accounts; the
/// debit entry is created first, then the credit entry, and the two are
/// linked via `paired_entry_id`.
pub fn build_pair(
    posting: &Posting,
    debit_balance_before: Money,
    credit_balance_before: Money,
) -> EntryPair {
    let now = Utc::now();
    let debit_id = EntryId::new();
    let credit_id = EntryId::new();

    let debit_delta = posting
        .debit_account
        .signed_amount(Side::Debit, posting.amount_minor);
    let credit_delta = posting
        .credit_account
        .signed_amount(Side::Credit, posting.amount_minor);

    let debit = LedgerEntry {
        id: debit_id,
        account: posting.debit_account,
        side: Side::Debit,
        amount_minor: posting.amount_minor,
        balance_before_minor: debit_balance_before,
        balance_after_minor: debit_balance_before + debit_delta,
        reference_type: posting.reference_type,
        reference_id: posting.reference_id.clone(),
        description: posting.description.clone(),
        paired_entry_id: Some(credit_id),
        created_at: now,
    };

    let credit = LedgerEntry {
        id: credit_id,
        account: posting.credit_account,
        side: Side::Credit,
        amount_minor: posting.amount_minor,
        balance_before_minor: credit_balance_before,
        balance_after_minor: credit_balance_before + credit_delta,
        reference_type: posting.reference_type,
        reference_id: posting.reference_id.clone(),
        description: posting.description.clone(),
        paired_entry_id: Some(debit_id),
        created_at: now,
    };

    EntryPair { debit, credit }
}

//! Logical accounts, entry sides, and business reference types.

use common::Money;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// The five logical accounts of the operator's books.
///
/// An account is a grouping key over ledger entries, not a row of its
/// own; its balance is always derived from the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    Cash,
    Inventory,
    Liabilities,
    Revenue,
    Expenses,
}

impl Account {
    /// All accounts, in canonical order.
    pub const ALL: [Account; 5] = [
        Account::Cash,
        Account::Inventory,
        Account::Liabilities,
        Account::Revenue,
        Account::Expenses,
    ];

    /// Returns the account name as stored in the journal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Account::Cash => "cash",
            Account::Inventory => "inventory",
            Account::Liabilities => "liabilities",
            Account::Revenue => "revenue",
            Account::Expenses => "expenses",
        }
    }

    /// True for accounts whose balance increases on the debit side
    /// (assets and expenses); liabilities and revenue increase on credit.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, Account::Cash | Account::Inventory | Account::Expenses)
    }

    /// The signed balance delta an entry of the given side applies.
    pub fn signed_amount(&self, side: Side, amount: Money) -> Money {
        let increases = match side {
            Side::Debit => self.is_debit_normal(),
            Side::Credit => !self.is_debit_normal(),
        };
        if increases {
            amount
        } else {
            Money::from_minor(-amount.minor())
        }
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Account {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Account::Cash),
            "inventory" => Ok(Account::Inventory),
            "liabilities" => Ok(Account::Liabilities),
            "revenue" => Ok(Account::Revenue),
            "expenses" => Ok(Account::Expenses),
            other => Err(LedgerError::UnknownAccount(other.to_string())),
        }
    }
}

/// The side of a double-entry posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    /// Returns the side name as stored in the journal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Debit => "debit",
            Side::Credit => "credit",
        }
    }

    /// The opposite side.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Debit => Side::Credit,
            Side::Credit => Side::Debit,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(Side::Debit),
            "credit" => Ok(Side::Credit),
            other => Err(LedgerError::UnknownSide(other.to_string())),
        }
    }
}

/// The business entity kind that caused a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Payment,
    Withdrawal,
    Referral,
    BulkPurchase,
    CampaignUsage,
}

impl ReferenceType {
    /// Returns the reference type name as stored in the journal.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Payment => "payment",
            ReferenceType::Withdrawal => "withdrawal",
            ReferenceType::Referral => "referral",
            ReferenceType::BulkPurchase => "bulk_purchase",
            ReferenceType::CampaignUsage => "campaign_usage",
        }
    }
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReferenceType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(ReferenceType::Payment),
            "withdrawal" => Ok(ReferenceType::Withdrawal),
            "referral" => Ok(ReferenceType::Referral),
            "bulk_purchase" => Ok(ReferenceType::BulkPurchase),
            "campaign_usage" => Ok(ReferenceType::CampaignUsage),
            other => Err(LedgerError::UnknownReferenceType(other.to_string())),
        }
    }
}

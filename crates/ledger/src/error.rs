use common::Money;
use thiserror::Error;

use crate::account::Account;

/// Errors that can occur when interacting with the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A posting amount was zero or negative.
    #[error("Invalid posting amount: {0} (must be strictly positive)")]
    InvalidAmount(Money),

    /// A posting named the same account on both sides.
    #[error("Invalid posting: debit and credit account are both {0}")]
    SameAccount(Account),

    /// A stored account name could not be parsed.
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// A stored entry side could not be parsed.
    #[error("Unknown entry side: {0}")]
    UnknownSide(String),

    /// A stored reference type could not be parsed.
    #[error("Unknown reference type: {0}")]
    UnknownReferenceType(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

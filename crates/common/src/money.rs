use serde::{Deserialize, Serialize};

/// A money amount in minor currency units (e.g., cents or paise).
///
/// Stored as a signed integer so that balances and net positions can go
/// negative during reconciliation, while individual ledger postings are
/// validated to be strictly positive at the recording boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    minor: i64,
}

impl Money {
    /// Creates a money amount from minor units.
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.minor < 0
    }

    /// Adds another amount.
    pub fn add(&self, other: Money) -> Money {
        Money {
            minor: self.minor + other.minor,
        }
    }

    /// Subtracts another amount.
    pub fn subtract(&self, other: Money) -> Money {
        Money {
            minor: self.minor - other.minor,
        }
    }

    /// Absolute value of the amount.
    pub fn abs(&self) -> Money {
        Money {
            minor: self.minor.abs(),
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::from_minor(self.minor + other.minor)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::from_minor(self.minor - other.minor)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.minor)
    }
}

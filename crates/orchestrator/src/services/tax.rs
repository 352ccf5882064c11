//! Withholding tax calculation for withdrawals.

use async_trait::async_trait;
use common::Money;
use saga::{OperationError, SagaContext};

/// Trait for computing the withholding tax on a gross withdrawal.
#[async_trait]
pub trait TaxService: Send + Sync {
    /// Returns the tax to withhold from the gross amount.
    async fn compute_withholding(
        &self,
        amount: Money,
        ctx: &SagaContext,
    ) -> Result<Money, OperationError>;
}

/// Flat-rate tax in basis points, rounded down to the minor unit.
#[derive(Debug, Clone, Copy)]
pub struct FlatRateTaxService {
    rate_bps: i64,
}

impl FlatRateTaxService {
    /// Creates a flat-rate service. `rate_bps` of 1000 withholds 10%.
    pub fn new(rate_bps: i64) -> Self {
        Self { rate_bps }
    }
}

#[async_trait]
impl TaxService for FlatRateTaxService {
    async fn compute_withholding(
        &self,
        amount: Money,
        _ctx: &SagaContext,
    ) -> Result<Money, OperationError> {
        if amount.is_negative() {
            return Err(OperationError::validation(format!(
                "cannot withhold tax on negative amount {amount}"
            )));
        }
        Ok(Money::from_minor(amount.minor() * self.rate_bps / 10_000))
    }
}

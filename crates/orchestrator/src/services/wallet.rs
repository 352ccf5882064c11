//! Wallet collaborator: user balance credits and debits.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, UserId};
use saga::OperationError;

/// Trait for wallet balance mutations.
///
/// Both calls fail with an error on insufficient funds or an invalid
/// user; each call is one atomic mutation on the wallet side.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Credits the user's wallet.
    async fn credit(
        &self,
        user: UserId,
        amount: Money,
        reason: &str,
        source_ref: &str,
    ) -> Result<(), OperationError>;

    /// Debits the user's wallet.
    async fn debit(
        &self,
        user: UserId,
        amount: Money,
        reason: &str,
        source_ref: &str,
    ) -> Result<(), OperationError>;
}

#[derive(Debug, Default)]
struct InMemoryWalletState {
    balances: HashMap<UserId, Money>,
    fail_on_credit: bool,
    fail_on_debit: bool,
}

/// In-memory wallet service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWalletService {
    state: Arc<RwLock<InMemoryWalletState>>,
}

impl InMemoryWalletService {
    /// Creates a new in-memory wallet service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user's balance.
    pub fn set_balance(&self, user: UserId, balance: Money) {
        self.state.write().unwrap().balances.insert(user, balance);
    }

    /// Returns a user's balance (zero for unknown users).
    pub fn balance(&self, user: UserId) -> Money {
        self.state
            .read()
            .unwrap()
            .balances
            .get(&user)
            .copied()
            .unwrap_or_default()
    }

    /// Configures the service to fail credit calls.
    pub fn set_fail_on_credit(&self, fail: bool) {
        self.state.write().unwrap().fail_on_credit = fail;
    }

    /// Configures the service to fail debit calls.
    pub fn set_fail_on_debit(&self, fail: bool) {
        self.state.write().unwrap().fail_on_debit = fail;
    }
}

#[async_trait]
impl WalletService for InMemoryWalletService {
    async fn credit(
        &self,
        user: UserId,
        amount: Money,
        _reason: &str,
        _source_ref: &str,
    ) -> Result<(), OperationError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_credit {
            return Err(OperationError::collaborator("wallet", "credit rejected"));
        }

        let balance = state.balances.entry(user).or_default();
        *balance = *balance + amount;
        Ok(())
    }

    async fn debit(
        &self,
        user: UserId,
        amount: Money,
        _reason: &str,
        _source_ref: &str,
    ) -> Result<(), OperationError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_debit {
            return Err(OperationError::collaborator("wallet", "debit rejected"));
        }

        let balance = state.balances.entry(user).or_default();
        if *balance < amount {
            return Err(OperationError::insufficient(format!(
                "wallet balance {} below requested debit {}",
                balance, amount
            )));
        }
        *balance = *balance - amount;
        Ok(())
    }
}

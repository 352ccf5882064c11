//! External transfer collaborator for withdrawal payouts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, UserId};
use saga::OperationError;
use serde::{Deserialize, Serialize};

/// Acknowledgement returned by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAck {
    pub transfer_reference: String,
}

/// Trait for moving money out of the platform.
///
/// Transfers are idempotent per withdrawal id: repeating a transfer for
/// the same withdrawal returns the original acknowledgement instead of
/// paying out twice.
#[async_trait]
pub trait TransferService: Send + Sync {
    /// Initiates a payout of `amount` to the user for the withdrawal.
    async fn transfer(
        &self,
        withdrawal_id: &str,
        user: UserId,
        amount: Money,
    ) -> Result<TransferAck, OperationError>;

    /// Voids a previously initiated transfer.
    async fn void(&self, transfer_reference: &str) -> Result<(), OperationError>;
}

#[derive(Debug, Default)]
struct InMemoryTransferState {
    next_id: u64,
    by_withdrawal: HashMap<String, TransferAck>,
    voided: Vec<String>,
    fail_on_transfer: bool,
}

/// In-memory transfer service recording payouts keyed by withdrawal id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransferService {
    state: Arc<RwLock<InMemoryTransferState>>,
}

impl InMemoryTransferService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent transfer call fail.
    pub fn set_fail_on_transfer(&self, fail: bool) {
        self.state.write().unwrap().fail_on_transfer = fail;
    }

    /// Number of distinct transfers initiated.
    pub fn transfer_count(&self) -> usize {
        self.state.read().unwrap().by_withdrawal.len()
    }

    /// Whether the reference has been voided.
    pub fn is_voided(&self, transfer_reference: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .voided
            .iter()
            .any(|r| r == transfer_reference)
    }
}

#[async_trait]
impl TransferService for InMemoryTransferService {
    async fn transfer(
        &self,
        withdrawal_id: &str,
        _user: UserId,
        _amount: Money,
    ) -> Result<TransferAck, OperationError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_transfer {
            return Err(OperationError::collaborator(
                "transfer",
                "payment provider rejected the transfer",
            ));
        }
        if let Some(existing) = state.by_withdrawal.get(withdrawal_id) {
            return Ok(existing.clone());
        }
        state.next_id += 1;
        let ack = TransferAck {
            transfer_reference: format!("xfer-{}", state.next_id),
        };
        state
            .by_withdrawal
            .insert(withdrawal_id.to_string(), ack.clone());
        Ok(ack)
    }

    async fn void(&self, transfer_reference: &str) -> Result<(), OperationError> {
        let mut state = self.state.write().unwrap();
        state.voided.push(transfer_reference.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transfer_is_idempotent_per_withdrawal() {
        let service = InMemoryTransferService::new();
        let user = UserId::new();
        let first = service
            .transfer("wd-1", user, Money::from_minor(900))
            .await
            .unwrap();
        let second = service
            .transfer("wd-1", user, Money::from_minor(900))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(service.transfer_count(), 1);
    }

    #[tokio::test]
    async fn failed_transfer_records_nothing() {
        let service = InMemoryTransferService::new();
        service.set_fail_on_transfer(true);

        let result = service
            .transfer("wd-1", UserId::new(), Money::from_minor(900))
            .await;
        assert!(matches!(
            result,
            Err(OperationError::ExternalCollaborator { .. })
        ));
        assert_eq!(service.transfer_count(), 0);
    }

    #[tokio::test]
    async fn void_marks_reference() {
        let service = InMemoryTransferService::new();
        let ack = service
            .transfer("wd-1", UserId::new(), Money::from_minor(500))
            .await
            .unwrap();

        service.void(&ack.transfer_reference).await.unwrap();
        assert!(service.is_voided(&ack.transfer_reference));
    }
}

//! Compliance collaborator: eligibility checks before money moves.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, UserId};
use saga::OperationError;
use serde::{Deserialize, Serialize};

/// The kind of money movement being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Investment,
    Referral,
    Withdrawal,
}

impl OperationKind {
    /// Returns the kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Investment => "investment",
            OperationKind::Referral => "referral",
            OperationKind::Withdrawal => "withdrawal",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for eligibility checks.
///
/// A denial is a validation failure, not a collaborator outage: it
/// carries the denial reason and needs no compensation because nothing
/// has moved yet.
#[async_trait]
pub trait ComplianceService: Send + Sync {
    /// Checks whether the user may perform the operation for the amount.
    async fn check_eligibility(
        &self,
        user: UserId,
        kind: OperationKind,
        amount: Money,
    ) -> Result<(), OperationError>;
}

#[derive(Debug, Default)]
struct InMemoryComplianceState {
    denied_users: HashSet<UserId>,
    denied_kinds: HashSet<OperationKind>,
}

/// In-memory compliance service for testing. Allows everything unless
/// a user or operation kind is explicitly denied.
#[derive(Debug, Clone, Default)]
pub struct InMemoryComplianceService {
    state: Arc<RwLock<InMemoryComplianceState>>,
}

impl InMemoryComplianceService {
    /// Creates a new allow-all compliance service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Denies all operations for the user.
    pub fn deny_user(&self, user: UserId) {
        self.state.write().unwrap().denied_users.insert(user);
    }

    /// Denies all operations of the kind.
    pub fn deny_kind(&self, kind: OperationKind) {
        self.state.write().unwrap().denied_kinds.insert(kind);
    }
}

#[async_trait]
impl ComplianceService for InMemoryComplianceService {
    async fn check_eligibility(
        &self,
        user: UserId,
        kind: OperationKind,
        _amount: Money,
    ) -> Result<(), OperationError> {
        let state = self.state.read().unwrap();
        if state.denied_users.contains(&user) {
            return Err(OperationError::validation(format!(
                "user {user} is not eligible"
            )));
        }
        if state.denied_kinds.contains(&kind) {
            return Err(OperationError::validation(format!(
                "{kind} operations are suspended"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_by_default() {
        let compliance = InMemoryComplianceService::new();
        compliance
            .check_eligibility(UserId::new(), OperationKind::Investment, Money::from_minor(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn denied_user_fails_validation() {
        let compliance = InMemoryComplianceService::new();
        let user = UserId::new();
        compliance.deny_user(user);

        let result = compliance
            .check_eligibility(user, OperationKind::Withdrawal, Money::from_minor(1))
            .await;
        assert!(matches!(result, Err(OperationError::Validation(_))));
    }

    #[tokio::test]
    async fn denied_kind_fails_validation() {
        let compliance = InMemoryComplianceService::new();
        compliance.deny_kind(OperationKind::Referral);

        let result = compliance
            .check_eligibility(UserId::new(), OperationKind::Referral, Money::from_minor(1))
            .await;
        assert!(matches!(result, Err(OperationError::Validation(_))));

        // Other kinds still pass.
        compliance
            .check_eligibility(UserId::new(), OperationKind::Investment, Money::from_minor(1))
            .await
            .unwrap();
    }
}

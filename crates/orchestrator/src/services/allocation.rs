//! Inventory allocation collaborator.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;
use saga::OperationError;
use serde::{Deserialize, Serialize};

/// A confirmed inventory allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub allocation_id: String,
}

/// Trait for reserving and releasing inventory units against an
/// investment.
#[async_trait]
pub trait AllocationService: Send + Sync {
    /// Reserves inventory for the investment, returning the allocation id.
    async fn allocate(&self, investment_id: &str, user: UserId)
    -> Result<Allocation, OperationError>;

    /// Releases a previously made allocation.
    async fn release(&self, allocation_id: &str) -> Result<(), OperationError>;
}

#[derive(Debug, Default)]
struct InMemoryAllocationState {
    next_id: u64,
    active: HashMap<String, UserId>,
    fail_on_allocate: bool,
}

/// In-memory allocation service with sequential allocation ids.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAllocationService {
    state: Arc<RwLock<InMemoryAllocationState>>,
}

impl InMemoryAllocationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent allocate call fail.
    pub fn set_fail_on_allocate(&self, fail: bool) {
        self.state.write().unwrap().fail_on_allocate = fail;
    }

    /// Number of allocations currently held.
    pub fn allocation_count(&self) -> usize {
        self.state.read().unwrap().active.len()
    }
}

#[async_trait]
impl AllocationService for InMemoryAllocationService {
    async fn allocate(
        &self,
        investment_id: &str,
        user: UserId,
    ) -> Result<Allocation, OperationError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_allocate {
            return Err(OperationError::collaborator(
                "allocation",
                format!("no inventory available for investment {investment_id}"),
            ));
        }
        state.next_id += 1;
        let allocation_id = format!("alloc-{}", state.next_id);
        state.active.insert(allocation_id.clone(), user);
        Ok(Allocation { allocation_id })
    }

    async fn release(&self, allocation_id: &str) -> Result<(), OperationError> {
        let mut state = self.state.write().unwrap();
        if state.active.remove(allocation_id).is_none() {
            return Err(OperationError::collaborator(
                "allocation",
                format!("unknown allocation {allocation_id}"),
            ));
        }
        Ok(())
    }
}

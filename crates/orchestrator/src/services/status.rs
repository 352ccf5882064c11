//! Entity status collaborator: final completed/reverted markers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use saga::OperationError;

/// Trait for flipping business-entity status at the end of a flow.
#[async_trait]
pub trait StatusService: Send + Sync {
    /// Marks the entity as completed.
    async fn mark_complete(&self, entity_type: &str, entity_id: &str)
    -> Result<(), OperationError>;

    /// Marks the entity as reverted after compensation.
    async fn mark_reverted(&self, entity_type: &str, entity_id: &str)
    -> Result<(), OperationError>;
}

/// In-memory status store keyed by `(entity_type, entity_id)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusService {
    statuses: Arc<RwLock<HashMap<(String, String), String>>>,
}

impl InMemoryStatusService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded status, if any.
    pub fn status_of(&self, entity_type: &str, entity_id: &str) -> Option<String> {
        self.statuses
            .read()
            .unwrap()
            .get(&(entity_type.to_string(), entity_id.to_string()))
            .cloned()
    }

    fn set(&self, entity_type: &str, entity_id: &str, status: &str) {
        self.statuses.write().unwrap().insert(
            (entity_type.to_string(), entity_id.to_string()),
            status.to_string(),
        );
    }
}

#[async_trait]
impl StatusService for InMemoryStatusService {
    async fn mark_complete(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<(), OperationError> {
        self.set(entity_type, entity_id, "completed");
        Ok(())
    }

    async fn mark_reverted(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<(), OperationError> {
        self.set(entity_type, entity_id, "reverted");
        Ok(())
    }
}

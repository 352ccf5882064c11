//! Provenance: reconstructing what happened to a business entity.

use saga::{SagaExecution, SagaStep};
use serde::{Deserialize, Serialize};

/// One saga that touched the entity, with its per-step records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub execution: SagaExecution,
    /// Step records in execution order.
    pub steps: Vec<SagaStep>,
}

/// Every saga that referenced a given business entity, newest first.
///
/// Built from the executions' immutable metadata, so the trail covers
/// completed, failed, compensated, and manually resolved sagas alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceTrail {
    pub entity_type: String,
    pub entity_id: String,
    pub sagas: Vec<ProvenanceEntry>,
}

impl ProvenanceTrail {
    /// True when no saga has ever referenced the entity.
    pub fn is_empty(&self) -> bool {
        self.sagas.is_empty()
    }
}

//! Structured flow outcomes.

use common::SagaId;
use serde::{Deserialize, Serialize};

/// What a flow invocation produced.
///
/// There is no partial success: `Failed` means the failing step's
/// predecessors have been compensated and the books are back where they
/// started (any individual compensation failures are recorded on the
/// saga's step rows for operator follow-up).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlowResult {
    /// Every step completed.
    Success {
        saga_id: SagaId,
        steps_executed: u32,
    },
    /// A step failed and compensation ran.
    Failed {
        saga_id: SagaId,
        compensated: bool,
        message: String,
    },
}

impl FlowResult {
    /// True for the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, FlowResult::Success { .. })
    }

    /// The saga this result belongs to.
    pub fn saga_id(&self) -> SagaId {
        match self {
            FlowResult::Success { saga_id, .. } | FlowResult::Failed { saga_id, .. } => *saga_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_accessors() {
        let id = SagaId::new();
        let result = FlowResult::Success {
            saga_id: id,
            steps_executed: 4,
        };
        assert!(result.is_success());
        assert_eq!(result.saga_id(), id);
    }

    #[test]
    fn failure_accessors() {
        let id = SagaId::new();
        let result = FlowResult::Failed {
            saga_id: id,
            compensated: true,
            message: "step 3 (allocate_inventory) failed".to_string(),
        };
        assert!(!result.is_success());
        assert_eq!(result.saga_id(), id);
    }
}

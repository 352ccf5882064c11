//! Saga lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The status of a saga execution.
///
/// Status transitions:
/// ```text
/// Initiated ──► Executing ──┬──► Completed
///                           └──► Failed ──► Compensated ──► ManuallyResolved
///                                  └────────────────────────────┘
/// ```
///
/// `Failed` is transient: the coordinator moves a failed saga to
/// `Compensated` immediately after the compensation pass. An operator
/// can move `Failed` or `Compensated` sagas to `ManuallyResolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SagaStatus {
    /// Execution record created, no step has run yet.
    #[default]
    Initiated,

    /// Steps are being executed.
    Executing,

    /// All steps completed successfully (terminal).
    Completed,

    /// A step failed; compensation is about to run (transient).
    Failed,

    /// Compensation pass finished (terminal unless manually resolved).
    Compensated,

    /// An operator recorded a manual resolution (terminal).
    ManuallyResolved,
}

impl SagaStatus {
    /// Returns true if the saga can begin executing steps.
    pub fn can_execute(&self) -> bool {
        matches!(self, SagaStatus::Initiated)
    }

    /// Returns true if the saga can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaStatus::Failed)
    }

    /// Returns true if an operator may record a manual resolution.
    pub fn can_resolve(&self) -> bool {
        matches!(self, SagaStatus::Failed | SagaStatus::Compensated)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaStatus::Completed | SagaStatus::Compensated | SagaStatus::ManuallyResolved
        )
    }

    /// Returns the status name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Initiated => "initiated",
            SagaStatus::Executing => "executing",
            SagaStatus::Completed => "completed",
            SagaStatus::Failed => "failed",
            SagaStatus::Compensated => "compensated",
            SagaStatus::ManuallyResolved => "manually_resolved",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SagaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(SagaStatus::Initiated),
            "executing" => Ok(SagaStatus::Executing),
            "completed" => Ok(SagaStatus::Completed),
            "failed" => Ok(SagaStatus::Failed),
            "compensated" => Ok(SagaStatus::Compensated),
            "manually_resolved" => Ok(SagaStatus::ManuallyResolved),
            other => Err(format!("unknown saga status: {other}")),
        }
    }
}

/// The outcome of a compensation attempt for one step.
///
/// Absent on a step row means compensation was never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationStatus {
    /// The step's forward effect was undone.
    Compensated,

    /// Undo failed; flagged for manual review, the chain continued.
    CompensationFailed,
}

impl CompensationStatus {
    /// Returns the status name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationStatus::Compensated => "compensated",
            CompensationStatus::CompensationFailed => "compensation_failed",
        }
    }
}

impl std::fmt::Display for CompensationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CompensationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compensated" => Ok(CompensationStatus::Compensated),
            "compensation_failed" => Ok(CompensationStatus::CompensationFailed),
            other => Err(format!("unknown compensation status: {other}")),
        }
    }
}

//! Reconciliation collaborator: compares the ledger against external
//! sources of truth.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use saga::OperationError;
use serde::{Deserialize, Serialize};

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub run_at: DateTime<Utc>,
    pub discrepancies: Vec<String>,
}

impl ReconciliationReport {
    /// True when no discrepancies were found.
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Trait for reconciling recorded entries against external statements.
#[async_trait]
pub trait ReconciliationService: Send + Sync {
    async fn reconcile(&self) -> Result<ReconciliationReport, OperationError>;
}

/// In-memory reconciliation service returning preloaded discrepancies.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReconciliationService {
    discrepancies: Arc<RwLock<Vec<String>>>,
}

impl InMemoryReconciliationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a discrepancy to be reported on the next run.
    pub fn add_discrepancy(&self, description: impl Into<String>) {
        self.discrepancies.write().unwrap().push(description.into());
    }
}

#[async_trait]
impl ReconciliationService for InMemoryReconciliationService {
    async fn reconcile(&self) -> Result<ReconciliationReport, OperationError> {
        Ok(ReconciliationReport {
            run_at: Utc::now(),
            discrepancies: self.discrepancies.read().unwrap().clone(),
        })
    }
}

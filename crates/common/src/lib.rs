//! Shared types for the financial orchestration core.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{EntryId, SagaId, UserId};

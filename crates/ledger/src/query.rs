use crate::account::{Account, ReferenceType};

/// Builder for read-only audit queries over the journal.
///
/// Filters compose with AND semantics; results are always ordered
/// newest first.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    /// Filter by account.
    pub account: Option<Account>,

    /// Filter by reference type.
    pub reference_type: Option<ReferenceType>,

    /// Filter by reference ID.
    pub reference_id: Option<String>,

    /// Maximum number of entries to return.
    pub limit: Option<usize>,
}

impl EntryQuery {
    /// Creates a new empty query (all entries, newest first).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a single account.
    pub fn for_account(account: Account) -> Self {
        Self {
            account: Some(account),
            ..Default::default()
        }
    }

    /// Creates a query for a business reference.
    pub fn for_reference(reference_type: ReferenceType, reference_id: impl Into<String>) -> Self {
        Self {
            reference_type: Some(reference_type),
            reference_id: Some(reference_id.into()),
            ..Default::default()
        }
    }

    /// Filters by account.
    pub fn account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    /// Filters by reference type.
    pub fn reference_type(mut self, reference_type: ReferenceType) -> Self {
        self.reference_type = Some(reference_type);
        self
    }

    /// Filters by reference ID.
    pub fn reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Limits the number of returned entries.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_composes_filters() {
        let query = EntryQuery::new()
            .account(Account::Cash)
            .reference_type(ReferenceType::Payment)
            .reference_id("42")
            .limit(10);

        assert_eq!(query.account, Some(Account::Cash));
        assert_eq!(query.reference_type, Some(ReferenceType::Payment));
        assert_eq!(query.reference_id.as_deref(), Some("42"));
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn for_reference_sets_both_fields() {
        let query = EntryQuery::for_reference(ReferenceType::Withdrawal, "w-7");
        assert_eq!(query.reference_type, Some(ReferenceType::Withdrawal));
        assert_eq!(query.reference_id.as_deref(), Some("w-7"));
        assert!(query.account.is_none());
    }
}

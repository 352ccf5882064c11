//! Saga execution context.

use std::collections::HashMap;

use common::SagaId;
use serde_json::Value;

/// The context one saga executes against.
///
/// Carries an immutable metadata map fixed at creation (entity ids,
/// amounts) and a mutable shared store for passing computed values
/// between ordered steps, scoped to the lifetime of one execution and
/// discarded after.
#[derive(Debug, Clone)]
pub struct SagaContext {
    saga_id: SagaId,
    metadata: HashMap<String, Value>,
    shared: HashMap<String, Value>,
}

impl SagaContext {
    /// Creates a context for the given persisted execution.
    pub fn new(saga_id: SagaId, metadata: HashMap<String, Value>) -> Self {
        Self {
            saga_id,
            metadata,
            shared: HashMap::new(),
        }
    }

    /// The persisted execution this context belongs to.
    pub fn saga_id(&self) -> SagaId {
        self.saga_id
    }

    /// The immutable metadata map.
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    /// Looks up a metadata value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Looks up a metadata value, falling back to a default.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.metadata.get(key).unwrap_or(default)
    }

    /// Metadata value as an integer amount in minor units.
    pub fn metadata_i64(&self, key: &str) -> Option<i64> {
        self.metadata.get(key).and_then(Value::as_i64)
    }

    /// Metadata value as a string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Stores a computed value for later steps.
    pub fn set_shared(&mut self, key: impl Into<String>, value: Value) {
        self.shared.insert(key.into(), value);
    }

    /// Looks up a value stored by an earlier step.
    pub fn get_shared(&self, key: &str) -> Option<&Value> {
        self.shared.get(key)
    }

    /// Looks up a shared value, falling back to a default.
    pub fn get_shared_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.shared.get(key).unwrap_or(default)
    }

    /// Shared value as an integer amount in minor units.
    pub fn shared_i64(&self, key: &str) -> Option<i64> {
        self.shared.get(key).and_then(Value::as_i64)
    }

    /// Returns true if an earlier step stored this key.
    pub fn has_shared(&self, key: &str) -> bool {
        self.shared.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> SagaContext {
        let mut metadata = HashMap::new();
        metadata.insert("payment_id".to_string(), json!(42));
        metadata.insert("amount_minor".to_string(), json!(10_000));
        metadata.insert("user_id".to_string(), json!("u-1"));
        SagaContext::new(SagaId::new(), metadata)
    }

    #[test]
    fn metadata_is_readable() {
        let ctx = context();
        assert_eq!(ctx.get("payment_id"), Some(&json!(42)));
        assert_eq!(ctx.metadata_i64("amount_minor"), Some(10_000));
        assert_eq!(ctx.metadata_str("user_id"), Some("u-1"));
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn get_or_falls_back() {
        let ctx = context();
        let default = json!(0);
        assert_eq!(ctx.get_or("missing", &default), &json!(0));
        assert_eq!(ctx.get_or("payment_id", &default), &json!(42));
    }

    #[test]
    fn shared_store_passes_values_between_steps() {
        let mut ctx = context();
        assert!(!ctx.has_shared("withholding_tax_minor"));

        ctx.set_shared("withholding_tax_minor", json!(500));
        assert!(ctx.has_shared("withholding_tax_minor"));
        assert_eq!(ctx.shared_i64("withholding_tax_minor"), Some(500));
        assert_eq!(ctx.get_shared("withholding_tax_minor"), Some(&json!(500)));
    }

    #[test]
    fn shared_does_not_leak_into_metadata() {
        let mut ctx = context();
        ctx.set_shared("discount_minor", json!(250));
        assert!(ctx.get("discount_minor").is_none());
        assert_eq!(ctx.metadata().len(), 3);
    }
}

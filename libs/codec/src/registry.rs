//! # Message Schema Registry
//!
//! ## Purpose
//!
//! Owned mapping from message id to [`MessageSchema`]. The registry is filled
//! by a schema provider (dictionary loader, generated tables, tests) during
//! startup and then frozen into an `Arc` shared by every decoder and encoder.
//!
//! ## Lifecycle
//!
//! ```text
//! new() → register()/replace() (&mut, single writer) → freeze() → Arc<Registry>
//!                                                          ↓
//!                                          lookup() from any thread, no locks
//! ```
//!
//! Registration never overwrites silently: a second `register` for the same id
//! fails with `DuplicateSchemaId`; overriding a dialect entry is an explicit
//! `replace`.

use crate::error::{CodecError, CodecResult};
use groundlink_types::MessageSchema;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct MessageSchemaRegistry {
    schemas: HashMap<u32, MessageSchema>,
}

impl MessageSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema, failing if its id is already taken
    pub fn register(&mut self, schema: MessageSchema) -> CodecResult<()> {
        if let Some(existing) = self.schemas.get(&schema.id()) {
            return Err(CodecError::DuplicateSchemaId {
                message_id: schema.id(),
                existing: existing.name().to_string(),
            });
        }
        debug!(
            msg_id = schema.id(),
            name = schema.name(),
            crc_extra = schema.crc_extra(),
            "schema registered"
        );
        self.schemas.insert(schema.id(), schema);
        Ok(())
    }

    /// Register several schemas, stopping at the first duplicate
    pub fn register_all(
        &mut self,
        schemas: impl IntoIterator<Item = MessageSchema>,
    ) -> CodecResult<()> {
        schemas.into_iter().try_for_each(|schema| self.register(schema))
    }

    /// Install a schema, returning the one it displaced
    pub fn replace(&mut self, schema: MessageSchema) -> Option<MessageSchema> {
        let previous = self.schemas.insert(schema.id(), schema);
        if let Some(previous) = &previous {
            info!(
                msg_id = previous.id(),
                name = previous.name(),
                "schema replaced"
            );
        }
        previous
    }

    #[inline]
    pub fn lookup(&self, message_id: u32) -> Option<&MessageSchema> {
        self.schemas.get(&message_id)
    }

    pub fn contains(&self, message_id: u32) -> bool {
        self.schemas.contains_key(&message_id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.schemas.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessageSchema> {
        self.schemas.values()
    }

    /// End the registration phase and share the registry read-only
    pub fn freeze(self) -> Arc<Self> {
        debug!(schemas = self.len(), "schema registry frozen");
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundlink_types::{FieldDescriptor, NativeType};

    fn schema(id: u32, name: &str, crc_extra: u8) -> MessageSchema {
        MessageSchema::new(
            id,
            name,
            crc_extra,
            vec![FieldDescriptor::scalar("value", NativeType::UInt8)],
        )
        .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = MessageSchemaRegistry::new();
        assert!(registry.is_empty());
        registry.register(schema(0, "HEARTBEAT", 50)).unwrap();
        registry.register(schema(300, "EXTENDED", 7)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup(0).map(|s| s.crc_extra()), Some(50));
        assert!(registry.contains(300));
        assert!(registry.lookup(1).is_none());
        assert_eq!(registry.ids(), vec![0, 300]);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = MessageSchemaRegistry::new();
        registry.register(schema(0, "HEARTBEAT", 50)).unwrap();

        let err = registry.register(schema(0, "LEGACY_HEARTBEAT", 80)).unwrap_err();
        assert_eq!(
            err,
            CodecError::DuplicateSchemaId {
                message_id: 0,
                existing: "HEARTBEAT".to_string()
            }
        );
        // original entry untouched
        assert_eq!(registry.lookup(0).map(|s| s.crc_extra()), Some(50));
    }

    #[test]
    fn test_replace_is_explicit() {
        let mut registry = MessageSchemaRegistry::new();
        assert!(registry.replace(schema(0, "HEARTBEAT", 50)).is_none());

        let previous = registry.replace(schema(0, "HEARTBEAT", 80)).unwrap();
        assert_eq!(previous.crc_extra(), 50);
        assert_eq!(registry.lookup(0).map(|s| s.crc_extra()), Some(80));
    }

    #[test]
    fn test_register_all_stops_at_duplicate() {
        let mut registry = MessageSchemaRegistry::new();
        let result = registry.register_all(vec![
            schema(1, "A", 1),
            schema(2, "B", 2),
            schema(1, "C", 3),
        ]);
        assert!(matches!(result, Err(CodecError::DuplicateSchemaId { message_id: 1, .. })));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_frozen_registry_is_shared() {
        let mut registry = MessageSchemaRegistry::new();
        registry.register(schema(0, "HEARTBEAT", 50)).unwrap();
        let shared = registry.freeze();
        let reader = Arc::clone(&shared);
        let handle = std::thread::spawn(move || reader.lookup(0).map(|s| s.name().to_string()));
        assert_eq!(handle.join().unwrap().as_deref(), Some("HEARTBEAT"));
    }
}

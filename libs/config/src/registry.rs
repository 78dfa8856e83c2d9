//! Registry assembly from configured dictionaries

use crate::dictionary::Dictionary;
use crate::link::LinkSettings;
use anyhow::{Context, Result};
use groundlink_codec::MessageSchemaRegistry;
use std::sync::Arc;
use tracing::{debug, info};

/// Build and freeze the schema registry for a link.
///
/// Configured dictionaries are registered first and must not overlap. The
/// bundled minimal dictionary only fills ids nobody else defined, so a full
/// dialect file can ship its own HEARTBEAT.
pub fn load_registry(settings: &LinkSettings) -> Result<Arc<MessageSchemaRegistry>> {
    let mut registry = MessageSchemaRegistry::new();

    for path in &settings.dictionaries {
        let dictionary = Dictionary::load(path)?;
        let schemas = dictionary
            .schemas()
            .with_context(|| format!("Invalid dictionary {:?}", path))?;
        registry
            .register_all(schemas)
            .with_context(|| format!("Dictionary {:?} redefines a message id", path))?;
    }

    if settings.include_minimal {
        for schema in Dictionary::minimal()?.schemas()? {
            if registry.contains(schema.id()) {
                debug!(msg_id = schema.id(), "bundled schema shadowed by configured dictionary");
                continue;
            }
            registry.register(schema)?;
        }
    }

    info!("Schema registry ready: {} messages", registry.len());
    Ok(registry.freeze())
}

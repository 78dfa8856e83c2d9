//! Message Dictionary Module
//!
//! Loads MAVLink message dictionaries from TOML and turns them into
//! [`MessageSchema`] values the codec registry understands. Dictionaries are
//! plain data: adding a message never requires a code change.
//!
//! ```toml
//! [[messages]]
//! id = 0
//! name = "HEARTBEAT"
//! crc_extra = 50
//!
//! [[messages.fields]]
//! name = "custom_mode"
//! type = "uint32_t"
//! ```

use anyhow::{bail, Context, Result};
use groundlink_types::{FieldDescriptor, MessageSchema, NativeType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Bundled dictionary containing HEARTBEAT
const MINIMAL_DICTIONARY: &str = include_str!("../dictionaries/minimal.toml");

/// A parsed dictionary file
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Dictionary {
    #[serde(default)]
    pub messages: Vec<MessageDefinition>,
}

/// One `[[messages]]` table
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MessageDefinition {
    pub id: u32,
    pub name: String,
    pub crc_extra: u8,

    /// Apply the MAVLink wire ordering rule (base fields by width, extensions last).
    /// Disable for dictionaries already listed in wire order.
    #[serde(default = "default_reorder")]
    pub reorder: bool,

    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// One `[[messages.fields]]` table
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,

    /// MAVLink type string, optionally with an array suffix (`char[16]`)
    #[serde(rename = "type")]
    pub type_name: String,

    pub array_length: Option<usize>,

    #[serde(default)]
    pub extension: bool,
}

fn default_reorder() -> bool {
    true
}

impl FieldDefinition {
    /// Resolve the type string and explicit length into a descriptor
    pub fn to_descriptor(&self) -> Result<FieldDescriptor> {
        let (native_type, suffix_length) = NativeType::parse_declaration(&self.type_name)
            .with_context(|| format!("Invalid type for field '{}'", self.name))?;

        let array_length = match (self.array_length, suffix_length) {
            (None, n) => n,
            (Some(explicit), 1) => explicit,
            (Some(explicit), n) if explicit == n => n,
            (Some(explicit), n) => bail!(
                "Field '{}' declares array_length {} but type '{}' implies {}",
                self.name,
                explicit,
                self.type_name,
                n
            ),
        };

        let descriptor = FieldDescriptor::array(self.name.clone(), native_type, array_length);
        Ok(if self.extension {
            descriptor.extension()
        } else {
            descriptor
        })
    }
}

impl MessageDefinition {
    /// Build the schema for this message
    pub fn to_schema(&self) -> Result<MessageSchema> {
        let fields = self
            .fields
            .iter()
            .map(FieldDefinition::to_descriptor)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Message {} ({})", self.id, self.name))?;

        let schema = if self.reorder {
            MessageSchema::with_wire_order(self.id, self.name.clone(), self.crc_extra, fields)
        } else {
            MessageSchema::new(self.id, self.name.clone(), self.crc_extra, fields)
        };
        schema.with_context(|| format!("Invalid schema for message {} ({})", self.id, self.name))
    }
}

impl Dictionary {
    /// Parse a dictionary from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let dictionary: Dictionary =
            toml::from_str(content).context("Failed to parse dictionary TOML")?;
        dictionary.check_unique_ids()?;
        Ok(dictionary)
    }

    /// Load a dictionary file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary {:?}", path))?;
        let dictionary = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load dictionary {:?}", path))?;
        info!(
            "Loaded dictionary {:?} ({} messages)",
            path,
            dictionary.messages.len()
        );
        Ok(dictionary)
    }

    /// The dictionary bundled with the crate
    pub fn minimal() -> Result<Self> {
        Self::from_toml_str(MINIMAL_DICTIONARY).context("Bundled minimal dictionary is invalid")
    }

    /// Convert every definition into a schema
    pub fn schemas(&self) -> Result<Vec<MessageSchema>> {
        self.messages
            .iter()
            .map(|definition| {
                let schema = definition.to_schema()?;
                debug!(
                    msg_id = schema.id(),
                    name = schema.name(),
                    min_len = schema.min_length(),
                    max_len = schema.max_length(),
                    "schema built"
                );
                Ok(schema)
            })
            .collect()
    }

    /// Look up a definition by message id
    pub fn get(&self, id: u32) -> Option<&MessageDefinition> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for message in &self.messages {
            if !seen.insert(message.id) {
                bail!(
                    "Message id {} ({}) is defined more than once",
                    message.id,
                    message.name
                );
            }
        }
        Ok(())
    }
}

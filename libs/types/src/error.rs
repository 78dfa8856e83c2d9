//! Schema validation errors
//!
//! Raised while constructing schemas and field descriptors, before any
//! byte ever reaches the codec. Decode/encode failures live in the codec crate.

use thiserror::Error;

/// Errors raised when a message schema or field descriptor is malformed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Fixed arrays must hold at least one element
    #[error("Field '{field}' declares array length 0 (scalars use length 1)")]
    ZeroArrayLength { field: String },

    /// Message ids are carried in 24 bits on the V2 wire
    #[error("Message id {id} exceeds the 24-bit MAVLink id space (max {max})")]
    MessageIdOutOfRange { id: u32, max: u32 },

    /// Payload length is carried in a single byte on the wire
    #[error("Schema {id} ({name}) has a maximum payload of {max_length} bytes, frames carry at most {limit}")]
    PayloadTooLarge {
        id: u32,
        name: String,
        max_length: usize,
        limit: usize,
    },

    /// Extension fields may only trail the base fields
    #[error("Schema {id} ({name}): base field '{field}' follows an extension field")]
    ExtensionNotTrailing {
        id: u32,
        name: String,
        field: String,
    },

    /// Unrecognised native type name in a dictionary
    #[error("Unknown native type '{name}': expected one of int8_t..uint64_t, float, double, char")]
    UnknownNativeType { name: String },

    /// Malformed array suffix such as `uint8_t[x]`
    #[error("Invalid array suffix in type '{type_name}'")]
    InvalidArraySuffix { type_name: String },
}

impl SchemaError {
    pub fn payload_too_large(id: u32, name: impl Into<String>, max_length: usize) -> Self {
        Self::PayloadTooLarge {
            id,
            name: name.into(),
            max_length,
            limit: crate::frame::MAX_PAYLOAD_LEN,
        }
    }
}

pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

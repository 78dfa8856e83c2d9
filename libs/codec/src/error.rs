//! Codec errors for MAVLink frame and payload processing
//!
//! Every decode-time error is recovered by the frame decoder and surfaced as a
//! value next to the offending bytes; encode-time errors abort a single
//! `encode` call. Each variant carries enough context to diagnose a link
//! problem from a log line alone.

use groundlink_types::SchemaError;
use thiserror::Error;

/// Codec errors with diagnostic context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// Structurally valid frame whose id has no registered schema
    #[error("Unknown message id {message_id}: no schema registered (frame dropped, stream in sync)")]
    UnknownMessageId { message_id: u32 },

    /// Frame checksum does not match the recomputed X.25 checksum
    #[error("Checksum mismatch for message {message_id}: received {received:#06x}, calculated {calculated:#06x} (payload: {payload_len} bytes, cause: {likely_cause})")]
    ChecksumMismatch {
        message_id: u32,
        received: u16,
        calculated: u16,
        payload_len: usize,
        likely_cause: String,
    },

    /// Signed frame whose signature does not verify against the local key
    #[error("Signature mismatch for message {message_id} on link {link_id} (timestamp {timestamp} ticks)")]
    SignatureMismatch {
        message_id: u32,
        link_id: u8,
        timestamp: u64,
    },

    /// Payload ends before a base field is complete
    #[error("Payload too short for message {message_id}: need at least {min_length} bytes, got {got} (stopped at field '{field}')")]
    PayloadTooShort {
        message_id: u32,
        min_length: usize,
        got: usize,
        field: String,
    },

    /// Payload is longer than every field of the schema put together
    #[error("Payload too long for message {message_id}: at most {max_length} bytes, got {got}")]
    PayloadTooLong {
        message_id: u32,
        max_length: usize,
        got: usize,
    },

    /// Record field count differs from the schema's
    #[error("Field count mismatch for message {message_id}: schema has {expected} fields, record has {got}")]
    FieldCountMismatch {
        message_id: u32,
        expected: usize,
        got: usize,
    },

    /// Array value length differs from its descriptor
    #[error("Array length mismatch for field '{field}': descriptor expects {expected} elements, value has {got}")]
    ArrayLengthMismatch {
        field: String,
        expected: usize,
        got: usize,
    },

    /// Value kind differs from the descriptor's native type
    #[error("Type mismatch for field '{field}': descriptor expects {expected}, value is {got}")]
    FieldTypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    /// Registration of an id that is already present
    #[error("Duplicate schema id {message_id}: already registered as '{existing}' (use replace to override)")]
    DuplicateSchemaId { message_id: u32, existing: String },

    /// Signing requested without a key
    #[error("Signing key missing: {context}")]
    SigningKeyMissing { context: String },

    /// Key safe has been erased
    #[error("Key safe {safe_id} has been deleted; signing is no longer possible")]
    KeyDeleted { safe_id: u64 },

    /// V2 header carries incompat bits this implementation does not understand
    #[error("Unsupported incompat flags {flags:#04x}: only {supported:#04x} is understood")]
    UnsupportedIncompatFlags { flags: u8, supported: u8 },

    /// Message id cannot be represented in the requested wire version
    #[error("Message id {message_id} does not fit a {version} frame (max {max})")]
    MessageIdOutOfRange {
        message_id: u32,
        version: String,
        max: u32,
    },

    /// Invalid schema definition
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl CodecError {
    pub fn unknown_message_id(message_id: u32) -> Self {
        Self::UnknownMessageId { message_id }
    }

    /// Create ChecksumMismatch with a guess at what went wrong
    pub fn checksum_mismatch(
        message_id: u32,
        received: u16,
        calculated: u16,
        payload_len: usize,
    ) -> Self {
        let likely_cause = if received.swap_bytes() == calculated {
            "checksum byte order (sender writes little-endian)"
        } else if received == 0 || received == 0xFFFF {
            "sender did not seal the frame"
        } else {
            "corruption in transit or CRC_EXTRA/dialect mismatch"
        };

        Self::ChecksumMismatch {
            message_id,
            received,
            calculated,
            payload_len,
            likely_cause: likely_cause.to_string(),
        }
    }

    pub fn payload_too_short(
        message_id: u32,
        min_length: usize,
        got: usize,
        field: impl Into<String>,
    ) -> Self {
        Self::PayloadTooShort {
            message_id,
            min_length,
            got,
            field: field.into(),
        }
    }

    pub fn field_type_mismatch(
        field: impl Into<String>,
        expected: impl ToString,
        got: impl ToString,
    ) -> Self {
        Self::FieldTypeMismatch {
            field: field.into(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    pub fn signing_key_missing(context: impl Into<String>) -> Self {
        Self::SigningKeyMissing {
            context: context.into(),
        }
    }

    /// Whether this error came from signature handling
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::SignatureMismatch { .. } | Self::SigningKeyMissing { .. } | Self::KeyDeleted { .. }
        )
    }
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;

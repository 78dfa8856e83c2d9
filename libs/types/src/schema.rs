//! # Message Schemas
//!
//! A [`MessageSchema`] is the explicit, declarative description of one MAVLink
//! message type: its id, its CRC_EXTRA seed and the ordered list of payload
//! fields. The codec walks `fields` in order for both packing and unpacking,
//! so the order stored here *is* the wire order.
//!
//! ## Length Bounds
//!
//! - `min_length`: sum of the wire sizes of all base (non-extension) fields
//! - `max_length`: sum of the wire sizes of all fields
//!
//! A schema without extensions has `min_length == max_length`. Extension fields
//! always trail the base fields; construction rejects any other layout.
//!
//! ## Wire Ordering
//!
//! MAVLink generators do not send fields in XML declaration order. Base fields
//! are stably sorted by element width, largest first, and extension fields are
//! appended afterwards in declaration order. [`MessageSchema::with_wire_order`]
//! applies that rule; [`MessageSchema::new`] keeps the order it is given.

use crate::error::{SchemaError, SchemaResult};
use crate::frame::{MAX_MESSAGE_ID, MAX_PAYLOAD_LEN, MAX_V1_MESSAGE_ID};
use crate::native::NativeType;
use crate::value::FieldValue;

/// Layout of one payload field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name, used for logging and record lookups
    pub name: String,
    /// Element kind
    pub native_type: NativeType,
    /// 1 for scalars, N for `type[N]` arrays
    pub array_length: usize,
    /// Extension fields may be truncated from the end of a V2 payload
    pub is_extension: bool,
}

impl FieldDescriptor {
    pub fn scalar(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            native_type,
            array_length: 1,
            is_extension: false,
        }
    }

    pub fn array(name: impl Into<String>, native_type: NativeType, array_length: usize) -> Self {
        Self {
            name: name.into(),
            native_type,
            array_length,
            is_extension: false,
        }
    }

    /// Mark this field as a MAVLink 2 extension
    pub fn extension(mut self) -> Self {
        self.is_extension = true;
        self
    }

    /// Bytes this field occupies on the wire
    #[inline]
    pub fn wire_size(&self) -> usize {
        self.native_type.width() * self.array_length
    }

    pub fn is_array(&self) -> bool {
        self.array_length > 1
    }

    /// Zero value used when an extension field is truncated from a payload
    pub fn zero_value(&self) -> FieldValue {
        FieldValue::zero(self.native_type, self.array_length)
    }
}

/// Complete description of one message type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSchema {
    id: u32,
    name: String,
    crc_extra: u8,
    fields: Vec<FieldDescriptor>,
    min_length: usize,
    max_length: usize,
}

impl MessageSchema {
    /// Create a schema keeping `fields` in the given (wire) order
    pub fn new(
        id: u32,
        name: impl Into<String>,
        crc_extra: u8,
        fields: Vec<FieldDescriptor>,
    ) -> SchemaResult<Self> {
        let name = name.into();

        if id > MAX_MESSAGE_ID {
            return Err(SchemaError::MessageIdOutOfRange {
                id,
                max: MAX_MESSAGE_ID,
            });
        }

        let mut seen_extension = false;
        for field in &fields {
            if field.array_length == 0 {
                return Err(SchemaError::ZeroArrayLength {
                    field: field.name.clone(),
                });
            }
            if field.is_extension {
                seen_extension = true;
            } else if seen_extension {
                return Err(SchemaError::ExtensionNotTrailing {
                    id,
                    name,
                    field: field.name.clone(),
                });
            }
        }

        let min_length = fields
            .iter()
            .filter(|f| !f.is_extension)
            .map(FieldDescriptor::wire_size)
            .sum();
        let max_length: usize = fields.iter().map(FieldDescriptor::wire_size).sum();

        if max_length > MAX_PAYLOAD_LEN {
            return Err(SchemaError::payload_too_large(id, name, max_length));
        }

        Ok(Self {
            id,
            name,
            crc_extra,
            fields,
            min_length,
            max_length,
        })
    }

    /// Create a schema from fields in dictionary declaration order,
    /// reordering them into MAVLink wire order first
    pub fn with_wire_order(
        id: u32,
        name: impl Into<String>,
        crc_extra: u8,
        fields: Vec<FieldDescriptor>,
    ) -> SchemaResult<Self> {
        let (mut base, extensions): (Vec<_>, Vec<_>) =
            fields.into_iter().partition(|f| !f.is_extension);
        // sort_by is stable: equal widths keep declaration order
        base.sort_by(|a, b| b.native_type.width().cmp(&a.native_type.width()));
        base.extend(extensions);
        Self::new(id, name, crc_extra, base)
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn crc_extra(&self) -> u8 {
        self.crc_extra
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[inline]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    #[inline]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn has_extensions(&self) -> bool {
        self.min_length != self.max_length
    }

    /// Whether this message id can be carried in a V1 frame
    pub fn fits_v1(&self) -> bool {
        self.id <= MAX_V1_MESSAGE_ID
    }

    /// Position of a field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

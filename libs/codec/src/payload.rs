//! # Payload Codec - Schema-Driven Field Packing
//!
//! ## Purpose
//!
//! Converts between typed [`Record`]s and the raw payload bytes of a frame,
//! walking the schema's fields in wire order.
//!
//! ## Encoding Rules
//!
//! - Scalars: little-endian at the native width
//! - Arrays: element by element in index order
//! - `char`: a single unsigned byte
//! - A field with `array_length == 1` is a scalar; an `Array` of one element
//!   is rejected so `unpack` always returns the shape `pack` accepted
//! - Extension fields: written only when extensions are requested (V2);
//!   packing stops at the first extension otherwise
//!
//! ## Decoding Rules
//!
//! - A base field that does not fit in the payload is `PayloadTooShort`
//! - An extension field cut off by the end of the payload is zero-filled;
//!   a partially present extension keeps its leading bytes and zero-extends
//!   the rest, matching MAVLink 2 trailing-byte truncation
//! - A payload longer than the schema's `max_length` is `PayloadTooLong`

use crate::error::{CodecError, CodecResult};
use groundlink_types::{FieldDescriptor, FieldValue, MessageSchema, NativeType, Record, Value};

/// Bytes `pack` will produce for a schema
pub fn packed_len(schema: &MessageSchema, include_extensions: bool) -> usize {
    if include_extensions {
        schema.max_length()
    } else {
        schema.min_length()
    }
}

/// Serialize field values in schema order
pub fn pack(
    schema: &MessageSchema,
    values: &[FieldValue],
    include_extensions: bool,
) -> CodecResult<Vec<u8>> {
    if values.len() != schema.fields().len() {
        return Err(CodecError::FieldCountMismatch {
            message_id: schema.id(),
            expected: schema.fields().len(),
            got: values.len(),
        });
    }

    let mut out = Vec::with_capacity(packed_len(schema, include_extensions));
    for (descriptor, value) in schema.fields().iter().zip(values) {
        if descriptor.is_extension && !include_extensions {
            break;
        }
        pack_field(descriptor, value, &mut out)?;
    }
    Ok(out)
}

/// Serialize a record against its schema
pub fn pack_record(
    schema: &MessageSchema,
    record: &Record,
    include_extensions: bool,
) -> CodecResult<Vec<u8>> {
    pack(schema, &record.fields, include_extensions)
}

fn pack_field(descriptor: &FieldDescriptor, value: &FieldValue, out: &mut Vec<u8>) -> CodecResult<()> {
    if !descriptor.is_array() && matches!(value, FieldValue::Array(_)) {
        return Err(CodecError::field_type_mismatch(
            &descriptor.name,
            descriptor.native_type,
            format!("{}[{}]", descriptor.native_type, value.len()),
        ));
    }

    let elements = value.elements();
    if elements.len() != descriptor.array_length {
        return Err(CodecError::ArrayLengthMismatch {
            field: descriptor.name.clone(),
            expected: descriptor.array_length,
            got: elements.len(),
        });
    }

    for element in elements {
        if element.native_type() != descriptor.native_type {
            return Err(CodecError::field_type_mismatch(
                &descriptor.name,
                descriptor.native_type,
                element.native_type(),
            ));
        }
        write_value(element, out);
    }
    Ok(())
}

#[inline]
fn write_value(value: &Value, out: &mut Vec<u8>) {
    match *value {
        Value::Int8(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::UInt8(v) | Value::Char(v) => out.push(v),
        Value::Int16(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::UInt16(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::UInt32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::UInt64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
    }
}

/// Deserialize a payload into a record
pub fn unpack(schema: &MessageSchema, payload: &[u8]) -> CodecResult<Record> {
    if payload.len() > schema.max_length() {
        return Err(CodecError::PayloadTooLong {
            message_id: schema.id(),
            max_length: schema.max_length(),
            got: payload.len(),
        });
    }

    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut offset = 0;

    for descriptor in schema.fields() {
        let size = descriptor.wire_size();
        let available = payload.len().saturating_sub(offset);

        let value = if available >= size {
            read_field(descriptor, &payload[offset..offset + size])
        } else if !descriptor.is_extension {
            return Err(CodecError::payload_too_short(
                schema.id(),
                schema.min_length(),
                payload.len(),
                &descriptor.name,
            ));
        } else if available == 0 {
            descriptor.zero_value()
        } else {
            let mut padded = vec![0u8; size];
            padded[..available].copy_from_slice(&payload[offset..]);
            read_field(descriptor, &padded)
        };

        fields.push(value);
        offset += size;
    }

    Ok(Record::new(schema.id(), fields))
}

fn read_field(descriptor: &FieldDescriptor, bytes: &[u8]) -> FieldValue {
    let width = descriptor.native_type.width();
    let mut elements = bytes
        .chunks_exact(width)
        .map(|chunk| read_value(descriptor.native_type, chunk));

    if descriptor.array_length == 1 {
        FieldValue::Scalar(
            elements
                .next()
                .unwrap_or_else(|| Value::zero(descriptor.native_type)),
        )
    } else {
        FieldValue::Array(elements.collect())
    }
}

/// Copy exactly `N` bytes; callers slice at the native width
#[inline]
fn le<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(&bytes[..N]);
    buf
}

#[inline]
fn read_value(kind: NativeType, bytes: &[u8]) -> Value {
    match kind {
        NativeType::Int8 => Value::Int8(i8::from_le_bytes(le(bytes))),
        NativeType::UInt8 => Value::UInt8(bytes[0]),
        NativeType::Char => Value::Char(bytes[0]),
        NativeType::Int16 => Value::Int16(i16::from_le_bytes(le(bytes))),
        NativeType::UInt16 => Value::UInt16(u16::from_le_bytes(le(bytes))),
        NativeType::Int32 => Value::Int32(i32::from_le_bytes(le(bytes))),
        NativeType::UInt32 => Value::UInt32(u32::from_le_bytes(le(bytes))),
        NativeType::Int64 => Value::Int64(i64::from_le_bytes(le(bytes))),
        NativeType::UInt64 => Value::UInt64(u64::from_le_bytes(le(bytes))),
        NativeType::Float => Value::Float(f32::from_le_bytes(le(bytes))),
        NativeType::Double => Value::Double(f64::from_le_bytes(le(bytes))),
    }
}

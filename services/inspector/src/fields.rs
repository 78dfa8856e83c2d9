//! `name=value` assignments → typed record

use anyhow::{anyhow, bail, Context, Result};
use groundlink_types::{FieldDescriptor, FieldValue, MessageSchema, NativeType, Record, Value};

/// Build a record from assignments; unassigned fields are zero
pub fn record_from_assignments(schema: &MessageSchema, assignments: &[String]) -> Result<Record> {
    let mut fields: Vec<FieldValue> = schema
        .fields()
        .iter()
        .map(FieldDescriptor::zero_value)
        .collect();

    for assignment in assignments {
        let (name, text) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected name=value, got '{}'", assignment))?;
        let name = name.trim();
        let index = schema.field_index(name).ok_or_else(|| {
            anyhow!("Message {} has no field '{}'", schema.name(), name)
        })?;
        let descriptor = &schema.fields()[index];
        fields[index] = parse_field(descriptor, text)
            .with_context(|| format!("Invalid value for {}.{}", schema.name(), name))?;
    }

    Ok(Record::new(schema.id(), fields))
}

/// Parse text for one field: scalars, comma separated arrays, or text for `char[N]`
pub fn parse_field(descriptor: &FieldDescriptor, text: &str) -> Result<FieldValue> {
    if descriptor.native_type == NativeType::Char {
        if text.len() > descriptor.array_length {
            bail!(
                "Text is {} bytes, field holds {}",
                text.len(),
                descriptor.array_length
            );
        }
        return Ok(FieldValue::text(text, descriptor.array_length));
    }

    let mut elements = text
        .split(',')
        .map(|item| parse_value(descriptor.native_type, item.trim()))
        .collect::<Result<Vec<_>>>()?;

    if !descriptor.is_array() {
        if elements.len() != 1 {
            bail!("Scalar field given {} values", elements.len());
        }
        return Ok(FieldValue::Scalar(elements.remove(0)));
    }

    if elements.len() > descriptor.array_length {
        bail!(
            "Array holds {} elements, got {}",
            descriptor.array_length,
            elements.len()
        );
    }
    elements.resize(descriptor.array_length, Value::zero(descriptor.native_type));
    Ok(FieldValue::Array(elements))
}

fn parse_value(kind: NativeType, text: &str) -> Result<Value> {
    let value = match kind {
        NativeType::Float => Value::Float(text.parse().context("not a float")?),
        NativeType::Double => Value::Double(text.parse().context("not a double")?),
        NativeType::Int8 => Value::Int8(parse_int(kind, text)?),
        NativeType::UInt8 => Value::UInt8(parse_int(kind, text)?),
        NativeType::Int16 => Value::Int16(parse_int(kind, text)?),
        NativeType::UInt16 => Value::UInt16(parse_int(kind, text)?),
        NativeType::Int32 => Value::Int32(parse_int(kind, text)?),
        NativeType::UInt32 => Value::UInt32(parse_int(kind, text)?),
        NativeType::Int64 => Value::Int64(parse_int(kind, text)?),
        NativeType::UInt64 => Value::UInt64(parse_int(kind, text)?),
        NativeType::Char => Value::Char(parse_int(kind, text)?),
    };
    Ok(value)
}

fn parse_int<T: TryFrom<i128>>(kind: NativeType, text: &str) -> Result<T> {
    T::try_from(parse_integer(text)?)
        .map_err(|_| anyhow!("{} is out of range for {}", text, kind))
}

/// Decimal or `0x` hex integer
fn parse_integer(text: &str) -> Result<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i128::from_str_radix(hex, 16),
        None => digits.parse::<i128>(),
    }
    .with_context(|| format!("'{}' is not an integer", text))?;
    Ok(if negative { -magnitude } else { magnitude })
}

//! Typed field values carried by decoded and outbound records

use crate::native::NativeType;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single element of a payload field, tagged with its native kind
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// One byte of a MAVLink `char` field (not a Unicode scalar)
    Char(u8),
}

impl Value {
    /// Zero value for a kind: 0, 0.0 or `'\0'`
    pub const fn zero(kind: NativeType) -> Self {
        match kind {
            NativeType::Int8 => Value::Int8(0),
            NativeType::UInt8 => Value::UInt8(0),
            NativeType::Int16 => Value::Int16(0),
            NativeType::UInt16 => Value::UInt16(0),
            NativeType::Int32 => Value::Int32(0),
            NativeType::UInt32 => Value::UInt32(0),
            NativeType::Int64 => Value::Int64(0),
            NativeType::UInt64 => Value::UInt64(0),
            NativeType::Float => Value::Float(0.0),
            NativeType::Double => Value::Double(0.0),
            NativeType::Char => Value::Char(0),
        }
    }

    pub const fn native_type(&self) -> NativeType {
        match self {
            Value::Int8(_) => NativeType::Int8,
            Value::UInt8(_) => NativeType::UInt8,
            Value::Int16(_) => NativeType::Int16,
            Value::UInt16(_) => NativeType::UInt16,
            Value::Int32(_) => NativeType::Int32,
            Value::UInt32(_) => NativeType::UInt32,
            Value::Int64(_) => NativeType::Int64,
            Value::UInt64(_) => NativeType::UInt64,
            Value::Float(_) => NativeType::Float,
            Value::Double(_) => NativeType::Double,
            Value::Char(_) => NativeType::Char,
        }
    }

    /// Integer view, `None` for floating point kinds
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::Int8(v) => Some(v.into()),
            Value::UInt8(v) | Value::Char(v) => Some(v.into()),
            Value::Int16(v) => Some(v.into()),
            Value::UInt16(v) => Some(v.into()),
            Value::Int32(v) => Some(v.into()),
            Value::UInt32(v) => Some(v.into()),
            Value::Int64(v) => Some(v.into()),
            Value::UInt64(v) => Some(v.into()),
            Value::Float(_) | Value::Double(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Float(v) => v.into(),
            Value::Double(v) => v,
            // i128 -> f64 is lossy above 2^53, acceptable for display purposes
            other => other.as_i128().unwrap_or_default() as f64,
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::Scalar(Value::$variant(v))
                }
            }
        )*
    };
}

impl_value_from! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int8(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{:?}", char::from(*v)),
        }
    }
}

/// Value of one schema field: a scalar or a fixed-length array
///
/// A field declared with one element is always a `Scalar`; `Array` is reserved
/// for fields of two or more elements.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldValue {
    Scalar(Value),
    Array(Vec<Value>),
}

impl FieldValue {
    /// Zero-filled value shaped like a descriptor
    pub fn zero(kind: NativeType, array_length: usize) -> Self {
        if array_length == 1 {
            FieldValue::Scalar(Value::zero(kind))
        } else {
            FieldValue::Array(vec![Value::zero(kind); array_length])
        }
    }

    /// Build a `char[N]` value from text, NUL-padded or truncated to `length`
    pub fn text(text: &str, length: usize) -> Self {
        let mut chars: Vec<Value> = text.bytes().take(length).map(Value::Char).collect();
        chars.resize(length, Value::Char(0));
        if length == 1 {
            FieldValue::Scalar(chars[0])
        } else {
            FieldValue::Array(chars)
        }
    }

    /// Number of elements (1 for scalars)
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Scalar(_) => 1,
            FieldValue::Array(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Array(values) if values.is_empty())
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            FieldValue::Array(_) => None,
        }
    }

    /// Elements in index order; a scalar is a one-element slice
    pub fn elements(&self) -> &[Value] {
        match self {
            FieldValue::Scalar(value) => std::slice::from_ref(value),
            FieldValue::Array(values) => values,
        }
    }

    /// Text view of a `char` field, stopping at the first NUL
    ///
    /// Returns `None` when the field is not a char field, or when non-NUL
    /// bytes follow the terminator and would be hidden by the text form.
    pub fn as_str(&self) -> Option<String> {
        let elements = self.elements();
        let mut text = Vec::with_capacity(elements.len());
        for (index, value) in elements.iter().enumerate() {
            match value {
                Value::Char(0) => {
                    let padded = elements[index..]
                        .iter()
                        .all(|rest| matches!(rest, Value::Char(0)));
                    if !padded {
                        return None;
                    }
                    break;
                }
                Value::Char(byte) => text.push(*byte),
                _ => return None,
            }
        }
        Some(String::from_utf8_lossy(&text).into_owned())
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<Vec<Value>> for FieldValue {
    fn from(values: Vec<Value>) -> Self {
        FieldValue::Array(values)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(value) => write!(f, "{value}"),
            FieldValue::Array(values) => {
                if let Some(text) = self.as_str() {
                    return write!(f, "{text:?}");
                }
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_match_kind() {
        for kind in NativeType::ALL {
            assert_eq!(Value::zero(kind).native_type(), kind);
        }
        assert_eq!(Value::zero(NativeType::Double), Value::Double(0.0));
        assert_eq!(Value::zero(NativeType::Char), Value::Char(0));
    }

    #[test]
    fn test_zero_field_shape() {
        assert_eq!(
            FieldValue::zero(NativeType::UInt16, 1),
            FieldValue::Scalar(Value::UInt16(0))
        );
        assert_eq!(FieldValue::zero(NativeType::Int8, 3).len(), 3);
    }

    #[test]
    fn test_text_pads_and_truncates() {
        let padded = FieldValue::text("GCS", 5);
        assert_eq!(padded.len(), 5);
        assert_eq!(padded.as_str().as_deref(), Some("GCS"));

        let truncated = FieldValue::text("GROUNDSTATION", 6);
        assert_eq!(truncated.as_str().as_deref(), Some("GROUND"));
    }

    #[test]
    fn test_as_str_rejects_numeric_fields() {
        let field = FieldValue::Array(vec![Value::UInt8(b'a'), Value::UInt8(b'b')]);
        assert_eq!(field.as_str(), None);
    }

    #[test]
    fn test_as_str_keeps_bytes_after_embedded_nul() {
        let field = FieldValue::Array(vec![Value::Char(b'A'), Value::Char(0), Value::Char(b'B')]);
        assert_eq!(field.as_str(), None);
        assert_eq!(field.to_string(), "['A', '\\0', 'B']");

        let padded = FieldValue::Array(vec![Value::Char(b'A'), Value::Char(0), Value::Char(0)]);
        assert_eq!(padded.as_str().as_deref(), Some("A"));
    }

    #[test]
    fn test_from_primitives() {
        assert_eq!(FieldValue::from(7u32), FieldValue::Scalar(Value::UInt32(7)));
        assert_eq!(Value::from(-1i16), Value::Int16(-1));
        assert_eq!(Value::UInt64(u64::MAX).as_i128(), Some(u64::MAX as i128));
        assert_eq!(Value::Float(1.5).as_i128(), None);
    }
}

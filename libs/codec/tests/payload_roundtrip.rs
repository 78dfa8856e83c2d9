//! Property tests for the schema-driven payload codec
//!
//! Schemas and values are generated together so every value sits inside its
//! field's native range. Floats are kept finite because NaN never compares equal.

use groundlink_codec::{
    pack, unpack, CodecError, FieldDescriptor, FieldValue, MessageSchema, NativeType, Value,
};
use proptest::prelude::*;

fn value_from_seed(kind: NativeType, seed: u64) -> Value {
    match kind {
        NativeType::Int8 => Value::Int8(seed as i8),
        NativeType::UInt8 => Value::UInt8(seed as u8),
        NativeType::Int16 => Value::Int16(seed as i16),
        NativeType::UInt16 => Value::UInt16(seed as u16),
        NativeType::Int32 => Value::Int32(seed as i32),
        NativeType::UInt32 => Value::UInt32(seed as u32),
        NativeType::Int64 => Value::Int64(seed as i64),
        NativeType::UInt64 => Value::UInt64(seed),
        NativeType::Float => Value::Float((seed as i32) as f32 * 0.5),
        NativeType::Double => Value::Double(((seed as i64) >> 11) as f64 * 0.25),
        NativeType::Char => Value::Char(seed as u8),
    }
}

/// (kind, array length, is_extension) per field
///
/// Lengths cover scalars, the smallest arrays and wider char buffers.
fn field_layouts() -> impl Strategy<Value = Vec<(u8, usize, bool)>> {
    let length = prop_oneof![3 => Just(1usize), 2 => 2usize..4, 1 => 4usize..17];
    proptest::collection::vec((0u8..11, length, proptest::bool::weighted(0.25)), 1..8)
}

fn build(layout: &[(u8, usize, bool)], seeds: &[u64]) -> (MessageSchema, Vec<FieldValue>) {
    let fields: Vec<FieldDescriptor> = layout
        .iter()
        .enumerate()
        .map(|(i, (kind, len, ext))| {
            let kind = NativeType::try_from(*kind).unwrap();
            // keep the schema under the 255-byte payload limit
            let len = (*len).min(32 / kind.width());
            let field = FieldDescriptor::array(format!("f{i}"), kind, len);
            if *ext {
                field.extension()
            } else {
                field
            }
        })
        .collect();
    let schema = MessageSchema::with_wire_order(500, "GENERATED", 0x5A, fields).unwrap();

    let mut seeds = seeds.iter().cycle();
    let values = schema
        .fields()
        .iter()
        .map(|field| {
            let mut elements: Vec<Value> = (0..field.array_length)
                .map(|_| value_from_seed(field.native_type, *seeds.next().unwrap()))
                .collect();
            if field.array_length == 1 {
                FieldValue::Scalar(elements.remove(0))
            } else {
                FieldValue::Array(elements)
            }
        })
        .collect();
    (schema, values)
}

proptest! {
    #[test]
    fn prop_unpack_inverts_pack(
        layout in field_layouts(),
        seeds in proptest::collection::vec(any::<u64>(), 1..64),
    ) {
        let (schema, values) = build(&layout, &seeds);
        let payload = pack(&schema, &values, true).unwrap();
        prop_assert_eq!(payload.len(), schema.max_length());

        let record = unpack(&schema, &payload).unwrap();
        prop_assert_eq!(record.fields, values);
    }

    #[test]
    fn prop_base_only_payload_zero_fills_extensions(
        layout in field_layouts(),
        seeds in proptest::collection::vec(any::<u64>(), 1..64),
    ) {
        let (schema, values) = build(&layout, &seeds);
        let payload = pack(&schema, &values, false).unwrap();
        prop_assert_eq!(payload.len(), schema.min_length());

        let record = unpack(&schema, &payload).unwrap();
        for ((field, decoded), original) in schema.fields().iter().zip(&record.fields).zip(&values) {
            if field.is_extension {
                prop_assert_eq!(decoded, &field.zero_value());
            } else {
                prop_assert_eq!(decoded, original);
            }
        }
    }

    #[test]
    fn prop_one_element_array_is_rejected_for_scalar_fields(
        layout in field_layouts(),
        seeds in proptest::collection::vec(any::<u64>(), 1..64),
        pick in any::<proptest::sample::Index>(),
    ) {
        let (schema, mut values) = build(&layout, &seeds);
        let scalars: Vec<usize> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| !field.is_array())
            .map(|(i, _)| i)
            .collect();
        prop_assume!(!scalars.is_empty());

        let index = scalars[pick.index(scalars.len())];
        let element = values[index].elements()[0];
        values[index] = FieldValue::Array(vec![element]);

        let is_type_mismatch = matches!(
            pack(&schema, &values, true),
            Err(CodecError::FieldTypeMismatch { .. })
        );
        prop_assert!(is_type_mismatch);
    }

    #[test]
    fn prop_truncated_base_fields_are_rejected(
        layout in field_layouts(),
        seeds in proptest::collection::vec(any::<u64>(), 1..64),
        cut in 1usize..8,
    ) {
        let (schema, values) = build(&layout, &seeds);
        prop_assume!(schema.min_length() > 0);
        let payload = pack(&schema, &values, true).unwrap();
        let keep = schema.min_length().saturating_sub(cut);

        let is_too_short = matches!(
            unpack(&schema, &payload[..keep]),
            Err(CodecError::PayloadTooShort { .. })
        );
        prop_assert!(is_too_short);
    }
}

//! Output formatting for decoded frames

use groundlink_codec::{MessageSchemaRegistry, RawFrame};
use groundlink_types::{FieldValue, Record, Value};
use serde_json::{json, Map};

/// One-line human readable summary
pub fn frame_line(registry: &MessageSchemaRegistry, frame: &RawFrame, record: &Record) -> String {
    let header = format!(
        "{:?} seq={:<3} sys={} comp={} msg={}",
        frame.version(),
        frame.seq(),
        frame.system_id(),
        frame.component_id(),
        frame.message_id(),
    );

    let Some(schema) = registry.lookup(record.message_id) else {
        return format!("{header} payload={}", hex::encode(frame.payload()));
    };

    let fields: Vec<String> = record
        .named(schema)
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    let signed = if frame.is_signed() { " [signed]" } else { "" };
    format!("{header} {}{signed} {{ {} }}", schema.name(), fields.join(", "))
}

/// Structured form for `--output json`
pub fn frame_json(
    registry: &MessageSchemaRegistry,
    frame: &RawFrame,
    record: &Record,
) -> serde_json::Value {
    let mut fields = Map::new();
    let name = registry.lookup(record.message_id).map(|schema| {
        for (field, value) in record.named(schema) {
            fields.insert(field.to_string(), field_json(value));
        }
        schema.name().to_string()
    });

    json!({
        "version": format!("{:?}", frame.version()),
        "seq": frame.seq(),
        "system_id": frame.system_id(),
        "component_id": frame.component_id(),
        "message_id": frame.message_id(),
        "name": name,
        "signed": frame.is_signed(),
        "link_id": frame.signature().map(|s| s.link_id),
        "fields": fields,
    })
}

/// Char arrays become strings; other arrays become JSON arrays
pub fn field_json(value: &FieldValue) -> serde_json::Value {
    match value {
        FieldValue::Scalar(scalar) => value_json(scalar),
        FieldValue::Array(elements) => match value.as_str() {
            Some(text) => json!(text),
            None => elements.iter().map(value_json).collect(),
        },
    }
}

fn value_json(value: &Value) -> serde_json::Value {
    match *value {
        Value::Int8(v) => json!(v),
        Value::UInt8(v) | Value::Char(v) => json!(v),
        Value::Int16(v) => json!(v),
        Value::UInt16(v) => json!(v),
        Value::Int32(v) => json!(v),
        Value::UInt32(v) => json!(v),
        Value::Int64(v) => json!(v),
        Value::UInt64(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Double(v) => json!(v),
    }
}

//! Shared schemas and records for codec integration tests

#![allow(dead_code)]

use groundlink_codec::{
    FieldDescriptor, FieldValue, MessageSchema, MessageSchemaRegistry, NativeType, Record, Value,
};
use std::sync::Arc;

pub const HEARTBEAT_ID: u32 = 0;
pub const GPS_STATUS_ID: u32 = 24;
pub const RADIO_STATUS_ID: u32 = 12_345;

/// Reference unsigned V2 heartbeat: seq 0, sys 1, comp 1, custom_mode 131081
pub const HEARTBEAT_V2: [u8; 21] = [
    0xFD, 0x09, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x09, 0x00, 0x02, 0x00, 0x00,
    0x00, 0x00, 0x04, 0x14, 0x54, 0x28,
];

pub fn heartbeat_schema() -> MessageSchema {
    MessageSchema::with_wire_order(
        HEARTBEAT_ID,
        "HEARTBEAT",
        50,
        vec![
            FieldDescriptor::scalar("type", NativeType::UInt8),
            FieldDescriptor::scalar("autopilot", NativeType::UInt8),
            FieldDescriptor::scalar("base_mode", NativeType::UInt8),
            FieldDescriptor::scalar("custom_mode", NativeType::UInt32),
            FieldDescriptor::scalar("system_status", NativeType::UInt8),
            FieldDescriptor::scalar("mavlink_version", NativeType::UInt8),
        ],
    )
    .expect("heartbeat schema")
}

/// A position-like message with arrays and two extensions
pub fn gps_status_schema() -> MessageSchema {
    MessageSchema::with_wire_order(
        GPS_STATUS_ID,
        "GPS_FIX_LITE",
        24,
        vec![
            FieldDescriptor::scalar("time_usec", NativeType::UInt64),
            FieldDescriptor::scalar("lat", NativeType::Int32),
            FieldDescriptor::scalar("lon", NativeType::Int32),
            FieldDescriptor::scalar("alt", NativeType::Float),
            FieldDescriptor::scalar("fix_type", NativeType::UInt8),
            FieldDescriptor::array("satellite_prn", NativeType::UInt8, 4),
            FieldDescriptor::scalar("hdop", NativeType::Double).extension(),
            FieldDescriptor::array("receiver", NativeType::Char, 6).extension(),
        ],
    )
    .expect("gps schema")
}

/// Message id beyond the V1 range
pub fn radio_status_schema() -> MessageSchema {
    MessageSchema::with_wire_order(
        RADIO_STATUS_ID,
        "RADIO_LINK_LITE",
        185,
        vec![
            FieldDescriptor::scalar("rssi", NativeType::Int16),
            FieldDescriptor::scalar("noise", NativeType::Int16),
            FieldDescriptor::scalar("rxerrors", NativeType::UInt16),
        ],
    )
    .expect("radio schema")
}

pub fn registry() -> Arc<MessageSchemaRegistry> {
    let mut registry = MessageSchemaRegistry::new();
    registry
        .register_all([heartbeat_schema(), gps_status_schema(), radio_status_schema()])
        .expect("distinct ids");
    registry.freeze()
}

/// Heartbeat record in wire order (custom_mode first)
pub fn heartbeat_record(custom_mode: u32, system_status: u8) -> Record {
    Record::new(
        HEARTBEAT_ID,
        vec![
            FieldValue::from(custom_mode),
            FieldValue::from(2u8),
            FieldValue::from(3u8),
            FieldValue::from(0x51u8),
            FieldValue::from(system_status),
            FieldValue::from(3u8),
        ],
    )
}

pub fn gps_record() -> Record {
    let schema = gps_status_schema();
    let mut fields = vec![FieldValue::Scalar(Value::UInt8(0)); schema.fields().len()];
    for (i, descriptor) in schema.fields().iter().enumerate() {
        fields[i] = match descriptor.name.as_str() {
            "time_usec" => FieldValue::from(1_700_000_000_000_000u64),
            "lat" => FieldValue::from(497_800_000i32),
            "lon" => FieldValue::from(99_300_000i32),
            "alt" => FieldValue::from(312.5f32),
            "fix_type" => FieldValue::from(3u8),
            "satellite_prn" => FieldValue::Array(vec![
                Value::UInt8(4),
                Value::UInt8(9),
                Value::UInt8(17),
                Value::UInt8(22),
            ]),
            "hdop" => FieldValue::from(0.9f64),
            "receiver" => FieldValue::text("UBX-M8", 6),
            other => panic!("unexpected field {other}"),
        };
    }
    Record::new(GPS_STATUS_ID, fields)
}

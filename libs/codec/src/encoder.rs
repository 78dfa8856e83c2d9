//! # Frame Encoder - Record to Wire Bytes
//!
//! ## Purpose
//!
//! Serializes a typed record, wraps it in a V1 or V2 header built from the
//! link's [`HeaderContext`], seals it with the X.25 checksum and, for signed V2
//! links, appends the 13-byte signature block.
//!
//! ## Sequence Accounting
//!
//! Every call to [`encode`] consumes exactly one sequence number, taken before
//! any validation. A failed call (field mismatch, missing or deleted key)
//! therefore still advances the link's counter: sequence numbers reflect
//! attempted transmissions, and the receiver sees the gap.
//!
//! ## Architecture Role
//!
//! ```text
//! Application → [FrameEncoder] → Vec<u8> → transport sink
//!      ↑              ↓
//!   Record    registry lookup → payload::pack → checksum → signing
//! ```

use crate::checksum::crc_with_extra;
use crate::error::{CodecError, CodecResult};
use crate::header_context::HeaderContext;
use crate::payload::pack;
use crate::registry::MessageSchemaRegistry;
use crate::signing::{self, sign_with_safe, SecretKeySafe, Timestamp};
use groundlink_types::{
    MavlinkVersion, MessageSchema, RawFrame, Record, SignatureBlock, V1Frame, V2Frame,
    MAX_V1_MESSAGE_ID,
};
use std::sync::Arc;
use tracing::debug;

/// Encode a record into ready-to-send bytes, signing with the current time
pub fn encode(
    schema: &MessageSchema,
    record: &Record,
    header_ctx: &HeaderContext,
    version: MavlinkVersion,
    secret_key: Option<&SecretKeySafe>,
) -> CodecResult<Vec<u8>> {
    encode_with_timestamp(schema, record, header_ctx, version, secret_key, signing::timestamp())
        .map(|frame| frame.to_bytes())
}

/// Encode a record into a frame, signing with an explicit timestamp
pub fn encode_with_timestamp(
    schema: &MessageSchema,
    record: &Record,
    header_ctx: &HeaderContext,
    version: MavlinkVersion,
    secret_key: Option<&SecretKeySafe>,
    timestamp: Timestamp,
) -> CodecResult<RawFrame> {
    let seq = header_ctx.next_seq();

    if version == MavlinkVersion::V1 && !schema.fits_v1() {
        return Err(CodecError::MessageIdOutOfRange {
            message_id: schema.id(),
            version: "MAVLink 1".to_string(),
            max: MAX_V1_MESSAGE_ID,
        });
    }

    // `MessageSchema::new` caps max_length at MAX_PAYLOAD_LEN, so this fits
    let payload = pack(schema, &record.fields, version == MavlinkVersion::V2)?;
    let len = payload.len() as u8;

    let frame = match version {
        MavlinkVersion::V1 => {
            let header = [
                len,
                seq,
                header_ctx.system_id(),
                header_ctx.component_id(),
                schema.id() as u8,
            ];
            RawFrame::V1(V1Frame {
                seq,
                system_id: header_ctx.system_id(),
                component_id: header_ctx.component_id(),
                message_id: schema.id() as u8,
                checksum: seal(&header, &payload, schema.crc_extra()),
                payload,
            })
        }
        MavlinkVersion::V2 => {
            let id = schema.id().to_le_bytes();
            let header = [
                len,
                header_ctx.incompat_flags(),
                header_ctx.compat_flags(),
                seq,
                header_ctx.system_id(),
                header_ctx.component_id(),
                id[0],
                id[1],
                id[2],
            ];
            let checksum = seal(&header, &payload, schema.crc_extra());

            let signature = if header_ctx.is_signing() {
                let safe = secret_key.ok_or_else(|| {
                    CodecError::signing_key_missing(format!(
                        "link {} signs frames but no key was supplied (message {})",
                        header_ctx.link_id(),
                        schema.id()
                    ))
                })?;
                let signature = sign_with_safe(
                    safe,
                    &header,
                    &payload,
                    schema.crc_extra(),
                    header_ctx.link_id(),
                    &timestamp,
                )?;
                Some(SignatureBlock {
                    link_id: header_ctx.link_id(),
                    timestamp,
                    signature,
                })
            } else {
                None
            };

            RawFrame::V2(V2Frame {
                incompat_flags: header_ctx.incompat_flags(),
                compat_flags: header_ctx.compat_flags(),
                seq,
                system_id: header_ctx.system_id(),
                component_id: header_ctx.component_id(),
                message_id: schema.id(),
                payload,
                checksum,
                signature,
            })
        }
    };

    debug!(
        msg_id = schema.id(),
        seq,
        len,
        signed = frame.is_signed(),
        "frame encoded"
    );
    Ok(frame)
}

fn seal(header: &[u8], payload: &[u8], crc_extra: u8) -> u16 {
    let mut covered = Vec::with_capacity(header.len() + payload.len());
    covered.extend_from_slice(header);
    covered.extend_from_slice(payload);
    crc_with_extra(&covered, crc_extra)
}

/// Per-link encoder resolving schemas by record id
#[derive(Debug)]
pub struct FrameEncoder {
    registry: Arc<MessageSchemaRegistry>,
    header_context: Arc<HeaderContext>,
    key_safe: Option<Arc<SecretKeySafe>>,
    version: MavlinkVersion,
}

impl FrameEncoder {
    pub fn new(
        registry: Arc<MessageSchemaRegistry>,
        header_context: Arc<HeaderContext>,
        version: MavlinkVersion,
    ) -> Self {
        Self {
            registry,
            header_context,
            key_safe: None,
            version,
        }
    }

    pub fn with_key_safe(mut self, key_safe: Arc<SecretKeySafe>) -> Self {
        self.key_safe = Some(key_safe);
        self
    }

    /// Swap the signing key
    ///
    /// The previous safe is erased when this encoder held its last reference.
    pub fn replace_key_safe(&mut self, key_safe: Option<Arc<SecretKeySafe>>) {
        let previous = std::mem::replace(&mut self.key_safe, key_safe);
        if let Some(owned) = previous.and_then(Arc::into_inner) {
            owned.delete_key();
        }
    }

    pub fn header_context(&self) -> &Arc<HeaderContext> {
        &self.header_context
    }

    pub fn version(&self) -> MavlinkVersion {
        self.version
    }

    /// Encode a record for this link
    ///
    /// An id with no schema fails before a sequence number is taken.
    pub fn encode(&self, record: &Record) -> CodecResult<Vec<u8>> {
        self.encode_frame(record).map(|frame| frame.to_bytes())
    }

    pub fn encode_frame(&self, record: &Record) -> CodecResult<RawFrame> {
        let schema = self
            .registry
            .lookup(record.message_id)
            .ok_or_else(|| CodecError::unknown_message_id(record.message_id))?;
        encode_with_timestamp(
            schema,
            record,
            &self.header_context,
            self.version,
            self.key_safe.as_deref(),
            signing::timestamp(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundlink_types::{FieldDescriptor, FieldValue, NativeType, SchemaError, Value, MAX_PAYLOAD_LEN};
    use hex_literal::hex;

    fn heartbeat() -> MessageSchema {
        MessageSchema::new(
            0,
            "HEARTBEAT",
            50,
            vec![
                FieldDescriptor::scalar("custom_mode", NativeType::UInt32),
                FieldDescriptor::scalar("type", NativeType::UInt8),
                FieldDescriptor::scalar("autopilot", NativeType::UInt8),
                FieldDescriptor::scalar("base_mode", NativeType::UInt8),
                FieldDescriptor::scalar("system_status", NativeType::UInt8),
                FieldDescriptor::scalar("mavlink_version", NativeType::UInt8),
            ],
        )
        .unwrap()
    }

    fn heartbeat_record() -> Record {
        Record::new(
            0,
            vec![
                FieldValue::from(131081u32),
                FieldValue::from(0u8),
                FieldValue::from(0u8),
                FieldValue::from(0u8),
                FieldValue::from(4u8),
                FieldValue::from(20u8),
            ],
        )
    }

    #[test]
    fn test_encode_v2_heartbeat_reference_bytes() {
        let ctx = HeaderContext::new(1, 1);
        let bytes = encode(&heartbeat(), &heartbeat_record(), &ctx, MavlinkVersion::V2, None).unwrap();
        assert_eq!(
            bytes,
            hex!("FD 09 00 00 00 01 01 00 00 00 09 00 02 00 00 00 00 04 14 54 28").to_vec()
        );
        assert_eq!(ctx.peek_seq(), 1);
    }

    #[test]
    fn test_encode_signed_reference_bytes() {
        let ctx = HeaderContext::new(1, 1).with_signing(true).with_link_id(2);
        let safe = SecretKeySafe::new(vec![0x97, 0x98, 0x99, 0xA0]);
        let frame = encode_with_timestamp(
            &heartbeat(),
            &heartbeat_record(),
            &ctx,
            MavlinkVersion::V2,
            Some(&safe),
            hex!("00 00 00 00 00 01"),
        )
        .unwrap();

        assert_eq!(frame.checksum(), 0xACCF);
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), 34);
        assert_eq!(&bytes[21..], &hex!("02 00 00 00 00 00 01 1c 61 90 5e 26 d0"));
    }

    #[test]
    fn test_encode_v1_layout() {
        let ctx = HeaderContext::new(255, 190).starting_at(7);
        let bytes = encode(&heartbeat(), &heartbeat_record(), &ctx, MavlinkVersion::V1, None).unwrap();
        assert_eq!(&bytes[..6], &[0xFE, 9, 7, 255, 190, 0]);
        assert_eq!(bytes.len(), 6 + 9 + 2);
        let checksum = crc_with_extra(&bytes[1..15], 50);
        assert_eq!(&bytes[15..], &checksum.to_be_bytes());
    }

    #[test]
    fn test_missing_key_still_consumes_sequence() {
        let ctx = HeaderContext::new(1, 1).with_signing(true);
        let err = encode(&heartbeat(), &heartbeat_record(), &ctx, MavlinkVersion::V2, None).unwrap_err();
        assert!(matches!(err, CodecError::SigningKeyMissing { .. }));
        assert_eq!(ctx.peek_seq(), 1);
    }

    #[test]
    fn test_deleted_key_fails_encode() {
        let ctx = HeaderContext::new(1, 1).with_signing(true);
        let safe = SecretKeySafe::new(vec![1; 32]);
        safe.delete_key();
        let err = encode(&heartbeat(), &heartbeat_record(), &ctx, MavlinkVersion::V2, Some(&safe))
            .unwrap_err();
        assert_eq!(err, CodecError::KeyDeleted { safe_id: safe.id() });
    }

    #[test]
    fn test_field_count_mismatch_consumes_sequence() {
        let ctx = HeaderContext::new(1, 1);
        let mut record = heartbeat_record();
        record.fields.truncate(2);
        assert!(matches!(
            encode(&heartbeat(), &record, &ctx, MavlinkVersion::V2, None),
            Err(CodecError::FieldCountMismatch { .. })
        ));
        assert_eq!(ctx.peek_seq(), 1);
    }

    #[test]
    fn test_largest_payload_fills_length_byte() {
        let schema = MessageSchema::new(
            42,
            "BLOB",
            7,
            vec![FieldDescriptor::array("data", NativeType::UInt8, MAX_PAYLOAD_LEN)],
        )
        .unwrap();
        let record = Record::new(42, vec![FieldValue::Array(vec![Value::UInt8(0xAB); MAX_PAYLOAD_LEN])]);
        let ctx = HeaderContext::new(1, 1);
        let bytes = encode(&schema, &record, &ctx, MavlinkVersion::V2, None).unwrap();
        assert_eq!(bytes[1], 0xFF);
        assert_eq!(bytes.len(), 10 + MAX_PAYLOAD_LEN + 2);

        let oversized = MessageSchema::new(
            43,
            "BLOB_TOO_BIG",
            7,
            vec![FieldDescriptor::array("data", NativeType::UInt8, MAX_PAYLOAD_LEN + 1)],
        );
        assert!(matches!(oversized, Err(SchemaError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_v1_rejects_large_message_ids() {
        let schema = MessageSchema::new(
            300,
            "WIDE_ID",
            1,
            vec![FieldDescriptor::scalar("x", NativeType::UInt8)],
        )
        .unwrap();
        let ctx = HeaderContext::new(1, 1);
        let record = Record::new(300, vec![FieldValue::from(1u8)]);
        assert!(matches!(
            encode(&schema, &record, &ctx, MavlinkVersion::V1, None),
            Err(CodecError::MessageIdOutOfRange { message_id: 300, .. })
        ));
        assert!(encode(&schema, &record, &ctx, MavlinkVersion::V2, None).is_ok());
    }

    #[test]
    fn test_frame_encoder_resolves_schema() {
        let mut registry = MessageSchemaRegistry::new();
        registry.register(heartbeat()).unwrap();
        let encoder = FrameEncoder::new(
            registry.freeze(),
            Arc::new(HeaderContext::new(1, 1)),
            MavlinkVersion::V2,
        );

        assert_eq!(encoder.encode(&heartbeat_record()).unwrap().len(), 21);
        assert_eq!(
            encoder.encode(&Record::new(99, vec![])),
            Err(CodecError::unknown_message_id(99))
        );
        // unknown ids do not take a sequence number
        assert_eq!(encoder.header_context().peek_seq(), 1);
    }

    #[test]
    fn test_replace_key_safe_keeps_shared_key() {
        let registry = MessageSchemaRegistry::new().freeze();
        let ctx = Arc::new(HeaderContext::new(1, 1).with_signing(true));
        let first = Arc::new(SecretKeySafe::new(vec![9; 32]));
        let mut encoder = FrameEncoder::new(registry, ctx, MavlinkVersion::V2)
            .with_key_safe(Arc::clone(&first));

        // shared with this test, so only the encoder's reference is dropped
        encoder.replace_key_safe(Some(Arc::new(SecretKeySafe::new(vec![7; 32]))));
        assert!(!first.is_deleted());
    }
}

//! # Frame Decoder - Incremental MAVLink Stream Parser
//!
//! ## Purpose
//!
//! Turns an arbitrarily fragmented byte stream into validated frames and typed
//! records. One decoder per byte stream: the caller `feed`s whatever chunk the
//! transport produced and calls `poll` until it reports `NeedMoreData`.
//!
//! ## State Machine
//!
//! ```text
//! SeekingStart ──marker──→ ReadingHeader ──→ ReadingPayload ──→ ReadingChecksum
//!      ↑                        │                                   │
//!      │              unsupported flags                   signed? ──┴── unsigned
//!      │               (drop marker)                        ↓            │
//!      │                        │                  ReadingSignature      │
//!      │                        ↓                           ↓            ↓
//!      └──────────────── Error / Frame ←──────────────── Emit ←──────────┘
//! ```
//!
//! Every state only advances once the bytes it needs are buffered; a
//! `NeedMoreData` result has no side effects beyond noise already discarded.
//!
//! ## Recovery
//!
//! All errors are values, never faults. After `Emit` the whole frame is
//! consumed whatever the outcome (unknown id, checksum, signature, payload
//! length), so a bad frame is never re-read and the next frame boundary is
//! found by the ordinary marker scan. A header rejected before its length is
//! trusted (unsupported incompat flags) drops only the marker byte.
//!
//! The declared length is trusted until the checksum is read, the same way
//! the MAVLink C parser treats it. A corrupted length byte therefore drops
//! the whole declared span, which can swallow frames that follow it; decoding
//! resumes at the first marker after that span.

use crate::checksum::crc_with_extra;
use crate::error::CodecError;
use crate::payload::unpack;
use crate::registry::MessageSchemaRegistry;
use crate::signing::{verify_with_safe, SecretKeySafe};
use bytes::{Buf, Bytes, BytesMut};
use groundlink_types::{
    MavlinkVersion, RawFrame, Record, SignatureBlock, V1Frame, V2Frame, CHECKSUM_LEN,
    IFLAG_SIGNED, SIGNATURE_BLOCK_LEN, STX_V1, STX_V2, SUPPORTED_INCOMPAT_FLAGS,
};
use std::sync::Arc;
use tracing::{debug, warn};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Outcome of one `poll`
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    /// Not enough buffered bytes to make progress
    NeedMoreData,
    /// A validated frame and its decoded payload
    Frame { frame: RawFrame, record: Record },
    /// A rejected frame together with the bytes that were dropped
    Error { error: CodecError, raw: Bytes },
}

impl DecodeResult {
    pub fn is_frame(&self) -> bool {
        matches!(self, DecodeResult::Frame { .. })
    }

    pub fn is_need_more_data(&self) -> bool {
        matches!(self, DecodeResult::NeedMoreData)
    }
}

/// Header fields parsed before the payload is buffered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MavlinkVersion,
    pub len: u8,
    pub incompat_flags: u8,
    pub compat_flags: u8,
    pub seq: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u32,
}

impl FrameHeader {
    fn parse(version: MavlinkVersion, h: &[u8]) -> Self {
        match version {
            MavlinkVersion::V1 => Self {
                version,
                len: h[0],
                incompat_flags: 0,
                compat_flags: 0,
                seq: h[1],
                system_id: h[2],
                component_id: h[3],
                message_id: u32::from(h[4]),
            },
            MavlinkVersion::V2 => Self {
                version,
                len: h[0],
                incompat_flags: h[1],
                compat_flags: h[2],
                seq: h[3],
                system_id: h[4],
                component_id: h[5],
                message_id: u32::from_le_bytes([h[6], h[7], h[8], 0]),
            },
        }
    }

    pub fn is_signed(&self) -> bool {
        self.version == MavlinkVersion::V2 && self.incompat_flags & IFLAG_SIGNED != 0
    }

    /// Offset of the payload from the start marker
    fn payload_offset(&self) -> usize {
        1 + self.version.header_len()
    }

    fn checksum_offset(&self) -> usize {
        self.payload_offset() + usize::from(self.len)
    }

    fn signature_offset(&self) -> usize {
        self.checksum_offset() + CHECKSUM_LEN
    }

    /// Total bytes on the wire, marker to last signature byte
    pub fn frame_len(&self) -> usize {
        let signature = if self.is_signed() { SIGNATURE_BLOCK_LEN } else { 0 };
        self.signature_offset() + signature
    }
}

/// Decoder position within the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    SeekingStart,
    ReadingHeader,
    ReadingPayload(FrameHeader),
    ReadingChecksum(FrameHeader),
    ReadingSignature(FrameHeader),
    Emit(FrameHeader),
}

/// Running counters, readable at any time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames: u64,
    pub noise_bytes: u64,
    pub checksum_errors: u64,
    pub signature_errors: u64,
    pub unknown_ids: u64,
    pub other_errors: u64,
}

impl DecoderStats {
    pub fn errors(&self) -> u64 {
        self.checksum_errors + self.signature_errors + self.unknown_ids + self.other_errors
    }
}

pub struct FrameDecoder {
    buffer: BytesMut,
    state: DecoderState,
    registry: Arc<MessageSchemaRegistry>,
    key_safe: Option<Arc<SecretKeySafe>>,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Decoder for unsigned traffic; signed frames report `SigningKeyMissing`
    pub fn new(registry: Arc<MessageSchemaRegistry>) -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: DecoderState::SeekingStart,
            registry,
            key_safe: None,
            stats: DecoderStats::default(),
        }
    }

    /// Decoder that verifies signed frames with `key_safe`
    pub fn with_key_safe(registry: Arc<MessageSchemaRegistry>, key_safe: Arc<SecretKeySafe>) -> Self {
        let mut decoder = Self::new(registry);
        decoder.key_safe = Some(key_safe);
        decoder
    }

    /// Swap the verification key
    ///
    /// The previous safe is erased when this decoder held its last reference.
    pub fn replace_key_safe(&mut self, key_safe: Option<Arc<SecretKeySafe>>) {
        let previous = std::mem::replace(&mut self.key_safe, key_safe);
        if let Some(owned) = previous.and_then(Arc::into_inner) {
            owned.delete_key();
        }
    }

    /// Append transport bytes; decoding happens in `poll`
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Bytes held but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn registry(&self) -> &Arc<MessageSchemaRegistry> {
        &self.registry
    }

    /// Drop buffered bytes and restart at `SeekingStart`
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = DecoderState::SeekingStart;
    }

    /// Advance the state machine as far as the buffered bytes allow
    pub fn poll(&mut self) -> DecodeResult {
        loop {
            match self.state {
                DecoderState::SeekingStart => {
                    let marker = self
                        .buffer
                        .iter()
                        .position(|byte| *byte == STX_V1 || *byte == STX_V2);
                    let noise = marker.unwrap_or(self.buffer.len());
                    if noise > 0 {
                        self.stats.noise_bytes += noise as u64;
                        debug!(bytes = noise, "discarding noise before start marker");
                        self.buffer.advance(noise);
                    }
                    if marker.is_none() {
                        return DecodeResult::NeedMoreData;
                    }
                    self.state = DecoderState::ReadingHeader;
                }

                DecoderState::ReadingHeader => {
                    let Some(version) = self.buffer.first().copied().and_then(MavlinkVersion::from_start_byte)
                    else {
                        // buffer was reset underneath us
                        self.state = DecoderState::SeekingStart;
                        continue;
                    };
                    let header_end = 1 + version.header_len();
                    if self.buffer.len() < header_end {
                        return DecodeResult::NeedMoreData;
                    }

                    let header = FrameHeader::parse(version, &self.buffer[1..header_end]);
                    let unsupported = header.incompat_flags & !SUPPORTED_INCOMPAT_FLAGS;
                    if unsupported != 0 {
                        return self.reject_marker(CodecError::UnsupportedIncompatFlags {
                            flags: header.incompat_flags,
                            supported: SUPPORTED_INCOMPAT_FLAGS,
                        });
                    }
                    self.state = DecoderState::ReadingPayload(header);
                }

                DecoderState::ReadingPayload(header) => {
                    if self.buffer.len() < header.checksum_offset() {
                        return DecodeResult::NeedMoreData;
                    }
                    self.state = DecoderState::ReadingChecksum(header);
                }

                DecoderState::ReadingChecksum(header) => {
                    if self.buffer.len() < header.signature_offset() {
                        return DecodeResult::NeedMoreData;
                    }
                    self.state = if header.is_signed() {
                        DecoderState::ReadingSignature(header)
                    } else {
                        DecoderState::Emit(header)
                    };
                }

                DecoderState::ReadingSignature(header) => {
                    if self.buffer.len() < header.frame_len() {
                        return DecodeResult::NeedMoreData;
                    }
                    self.state = DecoderState::Emit(header);
                }

                DecoderState::Emit(header) => {
                    self.state = DecoderState::SeekingStart;
                    let raw = self.buffer.split_to(header.frame_len()).freeze();
                    return self.emit(header, raw);
                }
            }
        }
    }

    /// Iterate over results until the decoder needs more data
    pub fn drain(&mut self) -> Drain<'_> {
        Drain { decoder: self }
    }

    /// Reject a header and resume scanning right after its start marker
    fn reject_marker(&mut self, error: CodecError) -> DecodeResult {
        self.stats.other_errors += 1;
        debug!(%error, "header rejected, resynchronising after start marker");
        let raw = self.buffer.split_to(1).freeze();
        self.state = DecoderState::SeekingStart;
        DecodeResult::Error { error, raw }
    }

    fn emit(&mut self, header: FrameHeader, raw: Bytes) -> DecodeResult {
        match self.validate(&header, &raw) {
            Ok((frame, record)) => {
                self.stats.frames += 1;
                debug!(
                    msg_id = header.message_id,
                    seq = header.seq,
                    len = header.len,
                    signed = header.is_signed(),
                    "frame decoded"
                );
                DecodeResult::Frame { frame, record }
            }
            Err(error) => {
                self.record_error(&error, &header);
                DecodeResult::Error { error, raw }
            }
        }
    }

    fn validate(&self, header: &FrameHeader, raw: &[u8]) -> Result<(RawFrame, Record), CodecError> {
        let schema = self
            .registry
            .lookup(header.message_id)
            .ok_or_else(|| CodecError::unknown_message_id(header.message_id))?;

        let payload_offset = header.payload_offset();
        let checksum_offset = header.checksum_offset();
        let header_bytes = &raw[1..payload_offset];
        let payload = &raw[payload_offset..checksum_offset];
        let received = u16::from_be_bytes([raw[checksum_offset], raw[checksum_offset + 1]]);

        let calculated = crc_with_extra(&raw[1..checksum_offset], schema.crc_extra());
        if calculated != received {
            return Err(CodecError::checksum_mismatch(
                header.message_id,
                received,
                calculated,
                payload.len(),
            ));
        }

        let signature = if header.is_signed() {
            let mut block = [0u8; SIGNATURE_BLOCK_LEN];
            block.copy_from_slice(&raw[header.signature_offset()..header.frame_len()]);
            let block = SignatureBlock::from_bytes(&block);

            let safe = self.key_safe.as_deref().ok_or_else(|| {
                CodecError::signing_key_missing(format!(
                    "signed frame for message {} but no key is configured",
                    header.message_id
                ))
            })?;
            let valid = verify_with_safe(
                safe,
                header_bytes,
                payload,
                schema.crc_extra(),
                block.link_id,
                &block.timestamp,
                &block.signature,
            )?;
            if !valid {
                return Err(CodecError::SignatureMismatch {
                    message_id: header.message_id,
                    link_id: block.link_id,
                    timestamp: block.timestamp_ticks(),
                });
            }
            Some(block)
        } else {
            None
        };

        let record = unpack(schema, payload)?;

        let frame = match header.version {
            MavlinkVersion::V1 => RawFrame::V1(V1Frame {
                seq: header.seq,
                system_id: header.system_id,
                component_id: header.component_id,
                message_id: header.message_id as u8,
                payload: payload.to_vec(),
                checksum: received,
            }),
            MavlinkVersion::V2 => RawFrame::V2(V2Frame {
                incompat_flags: header.incompat_flags,
                compat_flags: header.compat_flags,
                seq: header.seq,
                system_id: header.system_id,
                component_id: header.component_id,
                message_id: header.message_id,
                payload: payload.to_vec(),
                checksum: received,
                signature,
            }),
        };
        Ok((frame, record))
    }

    fn record_error(&mut self, error: &CodecError, header: &FrameHeader) {
        match error {
            CodecError::UnknownMessageId { .. } => {
                self.stats.unknown_ids += 1;
                debug!(msg_id = header.message_id, len = header.len, "unknown message id, frame dropped");
            }
            CodecError::ChecksumMismatch { .. } => {
                self.stats.checksum_errors += 1;
                warn!(msg_id = header.message_id, seq = header.seq, %error, "frame dropped");
            }
            CodecError::SignatureMismatch { .. }
            | CodecError::SigningKeyMissing { .. }
            | CodecError::KeyDeleted { .. } => {
                self.stats.signature_errors += 1;
                warn!(msg_id = header.message_id, seq = header.seq, %error, "frame dropped");
            }
            _ => {
                self.stats.other_errors += 1;
                debug!(msg_id = header.message_id, %error, "frame dropped");
            }
        }
    }
}

impl std::fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("buffered", &self.buffer.len())
            .field("state", &self.state)
            .field("schemas", &self.registry.len())
            .field("signing", &self.key_safe.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Iterator returned by [`FrameDecoder::drain`]
pub struct Drain<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Drain<'_> {
    type Item = DecodeResult;

    fn next(&mut self) -> Option<Self::Item> {
        match self.decoder.poll() {
            DecodeResult::NeedMoreData => None,
            result => Some(result),
        }
    }
}

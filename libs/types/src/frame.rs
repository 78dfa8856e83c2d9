//! # Raw MAVLink Frames
//!
//! Wire constants and the structurally-validated frame types emitted by the
//! decoder and produced by the encoder. A [`RawFrame`] carries the header
//! fields, the raw payload bytes and the trailing checksum/signature exactly
//! as they appeared on the wire; interpreting the payload is the codec's job.
//!
//! ## Wire Layout
//!
//! ```text
//! V1: FE | len | seq | sys | comp | msgid                          | payload | crc(2)
//! V2: FD | len | incompat | compat | seq | sys | comp | msgid(3 LE) | payload | crc(2) | [sig(13)]
//! ```
//!
//! The signature block (`link_id | timestamp(6) | signature(6)`) is present
//! iff `incompat & IFLAG_SIGNED`. The checksum is stored big-endian.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// V1 start-of-frame marker
pub const STX_V1: u8 = 0xFE;
/// V2 start-of-frame marker
pub const STX_V2: u8 = 0xFD;

/// Header bytes following the V1 marker: len, seq, sys, comp, msgid
pub const V1_HEADER_LEN: usize = 5;
/// Header bytes following the V2 marker: len, incompat, compat, seq, sys, comp, msgid(3)
pub const V2_HEADER_LEN: usize = 9;
pub const CHECKSUM_LEN: usize = 2;

pub const TIMESTAMP_LEN: usize = 6;
pub const SIGNATURE_LEN: usize = 6;
/// link id + timestamp + signature
pub const SIGNATURE_BLOCK_LEN: usize = 1 + TIMESTAMP_LEN + SIGNATURE_LEN;

/// incompat flag: frame carries a signature block
pub const IFLAG_SIGNED: u8 = 0x01;
/// Every incompat bit this implementation understands
pub const SUPPORTED_INCOMPAT_FLAGS: u8 = IFLAG_SIGNED;

pub const MAX_PAYLOAD_LEN: usize = 255;
pub const MAX_MESSAGE_ID: u32 = 0x00FF_FFFF;
pub const MAX_V1_MESSAGE_ID: u32 = 0xFF;

/// MAVLink wire version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MavlinkVersion {
    V1,
    V2,
}

impl MavlinkVersion {
    pub const fn start_byte(self) -> u8 {
        match self {
            MavlinkVersion::V1 => STX_V1,
            MavlinkVersion::V2 => STX_V2,
        }
    }

    /// Header length after the start marker
    pub const fn header_len(self) -> usize {
        match self {
            MavlinkVersion::V1 => V1_HEADER_LEN,
            MavlinkVersion::V2 => V2_HEADER_LEN,
        }
    }

    pub const fn from_start_byte(byte: u8) -> Option<Self> {
        match byte {
            STX_V1 => Some(MavlinkVersion::V1),
            STX_V2 => Some(MavlinkVersion::V2),
            _ => None,
        }
    }
}

/// Trailing authentication block of a signed V2 frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureBlock {
    pub link_id: u8,
    /// 10µs ticks since 2015-01-01T00:00:00Z, 48-bit big-endian
    pub timestamp: [u8; TIMESTAMP_LEN],
    pub signature: [u8; SIGNATURE_LEN],
}

impl SignatureBlock {
    pub fn from_bytes(bytes: &[u8; SIGNATURE_BLOCK_LEN]) -> Self {
        let mut timestamp = [0u8; TIMESTAMP_LEN];
        let mut signature = [0u8; SIGNATURE_LEN];
        timestamp.copy_from_slice(&bytes[1..1 + TIMESTAMP_LEN]);
        signature.copy_from_slice(&bytes[1 + TIMESTAMP_LEN..]);
        Self {
            link_id: bytes[0],
            timestamp,
            signature,
        }
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_BLOCK_LEN] {
        let mut bytes = [0u8; SIGNATURE_BLOCK_LEN];
        bytes[0] = self.link_id;
        bytes[1..1 + TIMESTAMP_LEN].copy_from_slice(&self.timestamp);
        bytes[1 + TIMESTAMP_LEN..].copy_from_slice(&self.signature);
        bytes
    }

    /// Timestamp as a tick count
    pub fn timestamp_ticks(&self) -> u64 {
        self.timestamp
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
    }
}

/// MAVLink 1 frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V1Frame {
    pub seq: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u8,
    pub payload: Vec<u8>,
    pub checksum: u16,
}

/// MAVLink 2 frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V2Frame {
    pub incompat_flags: u8,
    pub compat_flags: u8,
    pub seq: u8,
    pub system_id: u8,
    pub component_id: u8,
    /// 24-bit message id
    pub message_id: u32,
    pub payload: Vec<u8>,
    pub checksum: u16,
    /// Present iff `incompat_flags & IFLAG_SIGNED`
    pub signature: Option<SignatureBlock>,
}

/// A structurally complete frame of either wire version
///
/// Payloads are never longer than [`MAX_PAYLOAD_LEN`]; the decoder reads the
/// length from a single byte and the encoder refuses anything larger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    V1(V1Frame),
    V2(V2Frame),
}

impl RawFrame {
    pub fn version(&self) -> MavlinkVersion {
        match self {
            RawFrame::V1(_) => MavlinkVersion::V1,
            RawFrame::V2(_) => MavlinkVersion::V2,
        }
    }

    pub fn message_id(&self) -> u32 {
        match self {
            RawFrame::V1(f) => u32::from(f.message_id),
            RawFrame::V2(f) => f.message_id,
        }
    }

    pub fn seq(&self) -> u8 {
        match self {
            RawFrame::V1(f) => f.seq,
            RawFrame::V2(f) => f.seq,
        }
    }

    pub fn system_id(&self) -> u8 {
        match self {
            RawFrame::V1(f) => f.system_id,
            RawFrame::V2(f) => f.system_id,
        }
    }

    pub fn component_id(&self) -> u8 {
        match self {
            RawFrame::V1(f) => f.component_id,
            RawFrame::V2(f) => f.component_id,
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            RawFrame::V1(f) => &f.payload,
            RawFrame::V2(f) => &f.payload,
        }
    }

    /// Declared payload length (the `len` header byte)
    pub fn len(&self) -> u8 {
        self.payload().len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }

    pub fn checksum(&self) -> u16 {
        match self {
            RawFrame::V1(f) => f.checksum,
            RawFrame::V2(f) => f.checksum,
        }
    }

    pub fn signature(&self) -> Option<&SignatureBlock> {
        match self {
            RawFrame::V1(_) => None,
            RawFrame::V2(f) => f.signature.as_ref(),
        }
    }

    pub fn is_signed(&self) -> bool {
        self.signature().is_some()
    }

    /// Header bytes after the start marker, as covered by the checksum
    pub fn header_bytes(&self) -> Vec<u8> {
        let len = self.len();
        match self {
            RawFrame::V1(f) => vec![len, f.seq, f.system_id, f.component_id, f.message_id],
            RawFrame::V2(f) => {
                let id = f.message_id.to_le_bytes();
                vec![
                    len,
                    f.incompat_flags,
                    f.compat_flags,
                    f.seq,
                    f.system_id,
                    f.component_id,
                    id[0],
                    id[1],
                    id[2],
                ]
            }
        }
    }

    /// Total number of bytes this frame occupies on the wire
    pub fn wire_len(&self) -> usize {
        let signature = if self.is_signed() { SIGNATURE_BLOCK_LEN } else { 0 };
        1 + self.version().header_len() + self.payload().len() + CHECKSUM_LEN + signature
    }

    /// Serialize the frame exactly as it travels on the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());
        out.push(self.version().start_byte());
        out.extend_from_slice(&self.header_bytes());
        out.extend_from_slice(self.payload());
        out.extend_from_slice(&self.checksum().to_be_bytes());
        if let Some(signature) = self.signature() {
            out.extend_from_slice(&signature.to_bytes());
        }
        out
    }
}

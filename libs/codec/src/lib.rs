//! # Groundlink MAVLink Codec
//!
//! ## Purpose
//!
//! This crate is the "Rules" layer of Groundlink: everything needed to turn a
//! raw, possibly fragmented MAVLink byte stream into validated typed records,
//! and typed records back into framed, checksummed and optionally signed bytes.
//! - X.25 checksum engine with per-message CRC_EXTRA
//! - SHA-256 signing engine and secret key lifecycle
//! - Schema registry (message id → layout)
//! - Schema-driven payload packing with extension truncation
//! - Incremental V1/V2 frame decoder with resynchronisation
//! - Frame encoder with per-link sequence accounting
//!
//! ## Integration Points
//!
//! - **Byte Source**: transports call [`FrameDecoder::feed`] with whatever chunk they read
//! - **Byte Sink**: transports write the `Vec<u8>` returned by [`encode`] unmodified
//! - **Schema Provider**: a catalog loader registers every [`MessageSchema`] before decoding
//! - **Key Provisioning**: raw key bytes are handed to [`SecretKeySafe::new`]
//! - **Application Dispatch**: receives [`DecodeResult::Frame`] records and error values
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → transport (external)
//!     ↑           ↓              ↓
//! Pure Data   Framing/CRC     TCP / serial
//! Schemas     Signing         byte chunks
//! Records     Payloads
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Socket or serial I/O, reconnection
//! - Message routing between application components
//! - Concrete message dictionaries (supplied as schema data)
//!
//! ## Concurrency
//!
//! The codec never blocks. A [`FrameDecoder`] belongs to exactly one reader.
//! [`HeaderContext`] and [`SecretKeySafe`] are `Sync` and meant to be shared
//! through `Arc` by every producer on a link; the registry is frozen into an
//! `Arc` once startup registration is done.

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod header_context;
pub mod payload;
pub mod registry;
pub mod signing;

pub use checksum::{crc, crc_step, crc_with_extra, X25Checksum};
pub use decoder::{DecodeResult, DecoderState, DecoderStats, FrameDecoder, FrameHeader};
pub use encoder::{encode, encode_with_timestamp, FrameEncoder};
pub use error::{CodecError, CodecResult};
pub use header_context::HeaderContext;
pub use payload::{pack, pack_record, unpack};
pub use registry::MessageSchemaRegistry;
pub use signing::{raw_signature, signature_block, timestamp, verify, KeyErasure, SecretKeySafe};

// Re-export the data model so most users need a single dependency
pub use groundlink_types::{
    FieldDescriptor, FieldValue, MavlinkVersion, MessageSchema, NativeType, RawFrame, Record,
    SchemaError, SignatureBlock, Value,
};

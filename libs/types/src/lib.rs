//! # Groundlink Types Library
//!
//! Pure data model for the Groundlink MAVLink codec.
//!
//! ## Design Philosophy
//!
//! - **Explicit Schemas**: message layouts are data ([`MessageSchema`]), never discovered at runtime
//! - **Typed Values**: every payload element is tagged with its [`NativeType`]
//! - **Wire-Faithful Frames**: [`RawFrame`] keeps header, payload and trailer exactly as transmitted
//! - **Clear Boundaries**: no checksum, signing or parsing logic lives here
//!
//! ## Quick Start
//!
//! ```rust
//! use groundlink_types::{FieldDescriptor, FieldValue, MessageSchema, NativeType, Record};
//!
//! let heartbeat = MessageSchema::with_wire_order(
//!     0,
//!     "HEARTBEAT",
//!     50,
//!     vec![
//!         FieldDescriptor::scalar("type", NativeType::UInt8),
//!         FieldDescriptor::scalar("autopilot", NativeType::UInt8),
//!         FieldDescriptor::scalar("base_mode", NativeType::UInt8),
//!         FieldDescriptor::scalar("custom_mode", NativeType::UInt32),
//!         FieldDescriptor::scalar("system_status", NativeType::UInt8),
//!         FieldDescriptor::scalar("mavlink_version", NativeType::UInt8),
//!     ],
//! )?;
//! assert_eq!(heartbeat.max_length(), 9);
//!
//! let record = Record::new(0, vec![
//!     FieldValue::from(0u32),
//!     FieldValue::from(6u8),
//!     FieldValue::from(8u8),
//!     FieldValue::from(0u8),
//!     FieldValue::from(4u8),
//!     FieldValue::from(3u8),
//! ]);
//! assert_eq!(record.get(&heartbeat, "system_status"), Some(&FieldValue::from(4u8)));
//! # Ok::<(), groundlink_types::SchemaError>(())
//! ```
//!
//! ## Integration Points
//!
//! - **groundlink-codec**: packs/unpacks [`Record`]s against [`MessageSchema`]s and frames them
//! - **groundlink-config**: builds [`MessageSchema`]s from TOML message dictionaries
//! - **Applications**: receive [`Record`]s and [`RawFrame`]s from the decoder

pub mod error;
pub mod frame;
pub mod native;
pub mod record;
pub mod schema;
pub mod value;

pub use error::{SchemaError, SchemaResult};
pub use frame::{
    MavlinkVersion, RawFrame, SignatureBlock, V1Frame, V2Frame, CHECKSUM_LEN, IFLAG_SIGNED,
    MAX_MESSAGE_ID, MAX_PAYLOAD_LEN, MAX_V1_MESSAGE_ID, SIGNATURE_BLOCK_LEN, SIGNATURE_LEN,
    STX_V1, STX_V2, SUPPORTED_INCOMPAT_FLAGS, TIMESTAMP_LEN, V1_HEADER_LEN, V2_HEADER_LEN,
};
pub use native::NativeType;
pub use record::Record;
pub use schema::{FieldDescriptor, MessageSchema};
pub use value::{FieldValue, Value};

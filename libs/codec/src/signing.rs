//! # Signing Engine - MAVLink 2 Message Authentication
//!
//! ## Purpose
//!
//! Produces and checks the 6-byte truncated SHA-256 signature carried in the
//! 13-byte trailer of signed V2 frames, and owns the lifecycle of the shared
//! secret through [`SecretKeySafe`].
//!
//! ```text
//! signature = SHA256(key ‖ header ‖ payload ‖ crc_extra ‖ link_id ‖ timestamp)[..6]
//! timestamp = 10µs ticks since 2015-01-01T00:00:00Z, 48-bit big-endian
//! ```
//!
//! `header` is the 9 header bytes after the V2 start marker.
//!
//! ## Key Lifecycle
//!
//! ```text
//! provisioning → SecretKeySafe::new(key) → sign/verify (read lock) ...
//!                                        → delete_key() (write lock) → KeyDeleted
//! ```
//!
//! Erasure zero-fills the key buffer in place. A second erasure is reported as
//! [`KeyErasure::AlreadyDeleted`] and zero-fills again; no residual key
//! material survives either path. Dropping a safe also zero-fills it.

use crate::error::{CodecError, CodecResult};
use groundlink_types::{SignatureBlock, SIGNATURE_BLOCK_LEN, SIGNATURE_LEN, TIMESTAMP_LEN};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// 2015-01-01T00:00:00Z as seconds since the Unix epoch
pub const MAVLINK_EPOCH_UNIX_SECS: u64 = 1_420_070_400;

const TICK_MICROS: u128 = 10;
const TIMESTAMP_MASK: u64 = (1 << 48) - 1;

/// Process-wide id source for key safes
///
/// Ensures unique, monotonically increasing ids across all threads
static NEXT_SAFE_ID: AtomicU64 = AtomicU64::new(1);

pub type Timestamp = [u8; TIMESTAMP_LEN];
pub type Signature = [u8; SIGNATURE_LEN];

/// Current MAVLink signing timestamp
pub fn timestamp() -> Timestamp {
    timestamp_at(SystemTime::now())
}

/// Signing timestamp for an arbitrary instant
///
/// Instants before the MAVLink epoch clamp to zero.
pub fn timestamp_at(instant: SystemTime) -> Timestamp {
    let epoch = UNIX_EPOCH + Duration::from_secs(MAVLINK_EPOCH_UNIX_SECS);
    let ticks = instant
        .duration_since(epoch)
        .map(|elapsed| (elapsed.as_micros() / TICK_MICROS) as u64)
        .unwrap_or(0);
    timestamp_from_ticks(ticks)
}

/// Encode a tick count as the 48-bit big-endian wire timestamp
pub fn timestamp_from_ticks(ticks: u64) -> Timestamp {
    let be = (ticks & TIMESTAMP_MASK).to_be_bytes();
    let mut out = [0u8; TIMESTAMP_LEN];
    out.copy_from_slice(&be[8 - TIMESTAMP_LEN..]);
    out
}

/// First 6 bytes of the SHA-256 digest over the signed material
pub fn raw_signature(
    secret_key: &[u8],
    header_bytes: &[u8],
    payload: &[u8],
    crc_extra: u8,
    link_id: u8,
    timestamp: &Timestamp,
) -> Signature {
    let mut hasher = Sha256::new();
    hasher.update(secret_key);
    hasher.update(header_bytes);
    hasher.update(payload);
    hasher.update([crc_extra, link_id]);
    hasher.update(timestamp);

    let mut signature = [0u8; SIGNATURE_LEN];
    signature.copy_from_slice(&hasher.finalize()[..SIGNATURE_LEN]);
    signature
}

/// Complete 13-byte trailer: link id, timestamp, signature
pub fn signature_block(
    secret_key: &[u8],
    header_bytes: &[u8],
    payload: &[u8],
    crc_extra: u8,
    link_id: u8,
    timestamp: &Timestamp,
) -> [u8; SIGNATURE_BLOCK_LEN] {
    SignatureBlock {
        link_id,
        timestamp: *timestamp,
        signature: raw_signature(secret_key, header_bytes, payload, crc_extra, link_id, timestamp),
    }
    .to_bytes()
}

/// Recompute the signature and compare it in constant time
#[allow(clippy::too_many_arguments)]
pub fn verify(
    secret_key: &[u8],
    header_bytes: &[u8],
    payload: &[u8],
    crc_extra: u8,
    link_id: u8,
    timestamp: &Timestamp,
    candidate: &Signature,
) -> bool {
    let expected = raw_signature(secret_key, header_bytes, payload, crc_extra, link_id, timestamp);
    constant_time_eq(&expected, candidate)
}

/// Equality whose running time depends only on the input length
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}

/// Sign with the key held by a safe
pub fn sign_with_safe(
    safe: &SecretKeySafe,
    header_bytes: &[u8],
    payload: &[u8],
    crc_extra: u8,
    link_id: u8,
    timestamp: &Timestamp,
) -> CodecResult<Signature> {
    safe.with_key(|key| raw_signature(key, header_bytes, payload, crc_extra, link_id, timestamp))
}

/// Verify with the key held by a safe
#[allow(clippy::too_many_arguments)]
pub fn verify_with_safe(
    safe: &SecretKeySafe,
    header_bytes: &[u8],
    payload: &[u8],
    crc_extra: u8,
    link_id: u8,
    timestamp: &Timestamp,
    candidate: &Signature,
) -> CodecResult<bool> {
    safe.with_key(|key| {
        verify(key, header_bytes, payload, crc_extra, link_id, timestamp, candidate)
    })
}

/// Outcome of [`SecretKeySafe::delete_key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyErasure {
    /// Key material was present and has been zero-filled
    Erased,
    /// The safe was already empty; the buffer was zero-filled again
    AlreadyDeleted,
}

struct KeyMaterial {
    bytes: Vec<u8>,
    deleted: bool,
}

impl KeyMaterial {
    fn zero_fill(&mut self) {
        self.bytes.fill(0);
        // keep the stores from being elided as dead writes
        let _ = std::hint::black_box(&mut self.bytes);
    }
}

/// Holder of a link's signing secret
///
/// Signing and verification take the read lock; erasure takes the write lock,
/// so a deletion never interleaves with a signature computation. Callers are
/// still expected to drain in-flight signing before deleting.
pub struct SecretKeySafe {
    id: u64,
    material: RwLock<KeyMaterial>,
}

impl SecretKeySafe {
    pub fn new(secret_key: impl Into<Vec<u8>>) -> Self {
        let bytes = secret_key.into();
        let id = NEXT_SAFE_ID.fetch_add(1, Ordering::Relaxed);
        debug!(safe_id = id, key_len = bytes.len(), "secret key safe created");
        Self {
            id,
            material: RwLock::new(KeyMaterial {
                bytes,
                deleted: false,
            }),
        }
    }

    /// Build a safe from a hex-encoded key
    pub fn from_hex(encoded: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(encoded.trim()).map(Self::new)
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_deleted(&self) -> bool {
        self.material.read().deleted
    }

    pub fn key_len(&self) -> usize {
        self.material.read().bytes.len()
    }

    /// Whether the key buffer holds nothing but zero bytes
    pub fn is_zeroed(&self) -> bool {
        self.material.read().bytes.iter().all(|b| *b == 0)
    }

    /// Run `f` over the key bytes, failing with `KeyDeleted` after erasure
    pub fn with_key<R>(&self, f: impl FnOnce(&[u8]) -> R) -> CodecResult<R> {
        let material = self.material.read();
        if material.deleted {
            return Err(CodecError::KeyDeleted { safe_id: self.id });
        }
        Ok(f(&material.bytes))
    }

    /// Zero-fill the key buffer and mark the safe deleted
    pub fn delete_key(&self) -> KeyErasure {
        let mut material = self.material.write();
        material.zero_fill();
        if material.deleted {
            warn!(safe_id = self.id, "secret key safe deleted twice");
            KeyErasure::AlreadyDeleted
        } else {
            material.deleted = true;
            debug!(safe_id = self.id, "secret key erased");
            KeyErasure::Erased
        }
    }
}

impl Drop for SecretKeySafe {
    fn drop(&mut self) {
        self.material.get_mut().zero_fill();
    }
}

impl fmt::Debug for SecretKeySafe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let material = self.material.read();
        f.debug_struct("SecretKeySafe")
            .field("id", &self.id)
            .field("key_len", &material.bytes.len())
            .field("deleted", &material.deleted)
            .finish_non_exhaustive()
    }
}

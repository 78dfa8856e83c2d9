//! Per-link header bookkeeping for outbound frames
//!
//! One [`HeaderContext`] per outbound link. The sequence counter is an atomic
//! increment with wraparound, so producers on several threads can share a
//! context through an `Arc` without a lock. Sequence order across concurrent
//! callers is whatever order the increments land in.

use groundlink_types::IFLAG_SIGNED;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

#[derive(Debug)]
pub struct HeaderContext {
    incompat_flags: u8,
    compat_flags: u8,
    system_id: u8,
    component_id: u8,
    link_id: u8,
    seq: AtomicU8,
}

impl HeaderContext {
    pub fn new(system_id: u8, component_id: u8) -> Self {
        Self {
            incompat_flags: 0,
            compat_flags: 0,
            system_id,
            component_id,
            link_id: 0,
            seq: AtomicU8::new(0),
        }
    }

    pub fn with_incompat_flags(mut self, flags: u8) -> Self {
        self.incompat_flags = flags;
        self
    }

    pub fn with_compat_flags(mut self, flags: u8) -> Self {
        self.compat_flags = flags;
        self
    }

    pub fn with_link_id(mut self, link_id: u8) -> Self {
        self.link_id = link_id;
        self
    }

    /// Set or clear the signing bit in the incompat flags
    pub fn with_signing(mut self, enabled: bool) -> Self {
        if enabled {
            self.incompat_flags |= IFLAG_SIGNED;
        } else {
            self.incompat_flags &= !IFLAG_SIGNED;
        }
        self
    }

    /// Start the sequence counter somewhere other than 0
    pub fn starting_at(self, seq: u8) -> Self {
        self.seq.store(seq, Ordering::Relaxed);
        self
    }

    /// Return the current sequence number and advance it, wrapping 255 → 0
    pub fn next_seq(&self) -> u8 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        if seq == u8::MAX {
            debug!(
                system_id = self.system_id,
                component_id = self.component_id,
                "sequence counter wrapped, ids restart at 0"
            );
        }
        seq
    }

    /// Next sequence number without consuming it
    pub fn peek_seq(&self) -> u8 {
        self.seq.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn incompat_flags(&self) -> u8 {
        self.incompat_flags
    }

    #[inline]
    pub fn compat_flags(&self) -> u8 {
        self.compat_flags
    }

    #[inline]
    pub fn system_id(&self) -> u8 {
        self.system_id
    }

    #[inline]
    pub fn component_id(&self) -> u8 {
        self.component_id
    }

    #[inline]
    pub fn link_id(&self) -> u8 {
        self.link_id
    }

    pub fn is_signing(&self) -> bool {
        self.incompat_flags & IFLAG_SIGNED != 0
    }
}

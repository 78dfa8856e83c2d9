//! X.25 Checksum Engine
//!
//! CRC-16/MCRF4XX as used by MAVLink: polynomial 0x1021 reflected, seed
//! 0xFFFF, no final XOR. Every frame checksum covers the header bytes after
//! the start marker and the payload, then folds in the message's CRC_EXTRA
//! byte so that two dialects with the same id but different layouts never
//! validate each other's frames.

/// Checksum seed
pub const X25_INIT: u16 = 0xFFFF;

/// Fold one byte into a running checksum
#[inline]
pub fn crc_step(byte: u8, crc: u16) -> u16 {
    let mut tmp = byte ^ (crc & 0xFF) as u8;
    tmp ^= tmp << 4;
    let tmp = u16::from(tmp);
    (crc >> 8) ^ (tmp << 8) ^ (tmp << 3) ^ (tmp >> 4)
}

/// Checksum of a buffer from the standard seed
pub fn crc(buffer: &[u8]) -> u16 {
    buffer.iter().fold(X25_INIT, |acc, byte| crc_step(*byte, acc))
}

/// Checksum of `buffer ++ [crc_extra]`
pub fn crc_with_extra(buffer: &[u8], crc_extra: u8) -> u16 {
    crc_step(crc_extra, crc(buffer))
}

/// Verify a received checksum against header+payload bytes
pub fn verify_with_extra(buffer: &[u8], crc_extra: u8, received: u16) -> bool {
    crc_with_extra(buffer, crc_extra) == received
}

/// Streaming checksum calculator for frames assembled piecewise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X25Checksum {
    crc: u16,
}

impl X25Checksum {
    pub fn new() -> Self {
        Self { crc: X25_INIT }
    }

    #[inline]
    pub fn accumulate(&mut self, byte: u8) {
        self.crc = crc_step(byte, self.crc);
    }

    pub fn update(&mut self, data: &[u8]) {
        for byte in data {
            self.accumulate(*byte);
        }
    }

    /// Current value without consuming the calculator
    pub fn value(&self) -> u16 {
        self.crc
    }

    /// Fold in the CRC_EXTRA byte and return the frame checksum
    pub fn finalize(mut self, crc_extra: u8) -> u16 {
        self.accumulate(crc_extra);
        self.crc
    }

    pub fn reset(&mut self) {
        self.crc = X25_INIT;
    }
}

impl Default for X25Checksum {
    fn default() -> Self {
        Self::new()
    }
}

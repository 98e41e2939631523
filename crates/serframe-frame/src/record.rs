use bytes::{Buf, BufMut};

use crate::error::{FrameError, Result};

/// Encoded size of a [`ConfigRecord`]: version (4) + blink (2) + mode (1) + reserved (1).
pub const RECORD_SIZE: usize = 8;

/// Smallest accepted blink period in milliseconds.
pub const BLINK_MS_MIN: u16 = 100;
/// Largest accepted blink period in milliseconds.
pub const BLINK_MS_MAX: u16 = 5000;

/// Smallest accepted mode.
pub const MODE_MIN: u8 = 0;
/// Largest accepted mode. Kept as an explicit bound even though it spans the
/// whole `u8` range, so narrowing it (or widening the field) stays a one-line change.
pub const MODE_MAX: u8 = 255;

/// The device configuration carried as a frame payload.
///
/// Layout (little-endian, packed):
/// ```text
/// ┌──────────────┬────────────┬──────────┬──────────────┐
/// │ version (4B) │ blink (2B) │ mode (1) │ reserved (1) │
/// └──────────────┴────────────┴──────────┴──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRecord {
    /// Configuration layout version.
    pub version: u32,
    /// LED blink period in milliseconds (100..=5000).
    pub blink_ms: u16,
    /// Device operating mode.
    pub mode: u8,
    /// Unused; sent as-is.
    pub reserved: u8,
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self {
            version: 2,
            blink_ms: 300,
            mode: 1,
            reserved: 0,
        }
    }
}

impl ConfigRecord {
    /// Build a record, checking field bounds.
    pub fn new(version: u32, blink_ms: u16, mode: u8, reserved: u8) -> Result<Self> {
        let record = Self {
            version,
            blink_ms,
            mode,
            reserved,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check every bounded field.
    pub fn validate(&self) -> Result<()> {
        if !(BLINK_MS_MIN..=BLINK_MS_MAX).contains(&self.blink_ms) {
            return Err(FrameError::Validation {
                field: "blink_ms",
                value: u64::from(self.blink_ms),
                min: u64::from(BLINK_MS_MIN),
                max: u64::from(BLINK_MS_MAX),
            });
        }
        if !(MODE_MIN..=MODE_MAX).contains(&self.mode) {
            return Err(FrameError::Validation {
                field: "mode",
                value: u64::from(self.mode),
                min: u64::from(MODE_MIN),
                max: u64::from(MODE_MAX),
            });
        }
        Ok(())
    }

    /// Serialize into `dst` in wire order.
    pub fn put(&self, dst: &mut impl BufMut) {
        dst.put_u32_le(self.version);
        dst.put_u16_le(self.blink_ms);
        dst.put_u8(self.mode);
        dst.put_u8(self.reserved);
    }

    /// The packed payload bytes.
    pub fn to_payload(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        self.put(&mut &mut out[..]);
        out
    }

    /// Parse and validate a packed payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() != RECORD_SIZE {
            return Err(FrameError::RecordSize {
                expected: RECORD_SIZE,
                actual: payload.len(),
            });
        }

        let mut src = payload;
        let record = Self {
            version: src.get_u32_le(),
            blink_ms: src.get_u16_le(),
            mode: src.get_u8(),
            reserved: src.get_u8(),
        };
        record.validate()?;
        Ok(record)
    }
}

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::record::{ConfigRecord, RECORD_SIZE};

/// Frame header: payload length (4).
pub const HEADER_SIZE: usize = 4;

/// Frame trailer: CRC-32 of the payload (4).
pub const TRAILER_SIZE: usize = 4;

/// Smallest possible frame (empty payload).
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + TRAILER_SIZE;

/// CRC-32 (ISO-HDLC) of `data`, the same value zlib's `crc32` returns.
pub fn checksum(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────────────┬──────────────┐
/// │ Length       │ Payload         │ CRC-32       │
/// │ (4B LE)      │ (Length bytes)  │ (4B LE)      │
/// └──────────────┴─────────────────┴──────────────┘
/// ```
///
/// The checksum covers the payload only, never the length header.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(MIN_FRAME_SIZE + payload.len());
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    dst.put_u32_le(checksum(payload));
    Ok(())
}

/// Validate `record` and encode it as a complete frame.
pub fn encode_record(record: &ConfigRecord) -> Result<Bytes> {
    record.validate()?;

    let payload = record.to_payload();
    let mut dst = BytesMut::with_capacity(MIN_FRAME_SIZE + RECORD_SIZE);
    encode_frame(&payload, &mut dst)?;
    Ok(dst.freeze())
}

/// A frame taken apart by [`decode_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// The payload, exactly as many bytes as the header declared.
    pub payload: Bytes,
    /// The checksum carried in the trailer.
    pub checksum: u32,
    /// Whether the trailer matches the CRC-32 recomputed from `payload`.
    pub verified: bool,
}

/// Decode one complete frame.
///
/// The buffer must hold exactly one frame: a length header that disagrees
/// with the number of bytes that follow is rejected. A checksum mismatch is
/// not an error; it is reported through [`DecodedFrame::verified`] so the
/// caller decides whether to drop the payload.
pub fn decode_frame(src: &[u8]) -> Result<DecodedFrame> {
    if src.len() < MIN_FRAME_SIZE {
        return Err(FrameError::TooShort {
            len: src.len(),
            min: MIN_FRAME_SIZE,
        });
    }

    let (header, rest) = src.split_at(HEADER_SIZE);
    let declared = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let available = rest.len() - TRAILER_SIZE;

    if declared != available {
        return Err(FrameError::LengthMismatch {
            declared,
            available,
        });
    }

    let (payload, trailer) = rest.split_at(declared);
    let carried = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let verified = checksum(payload) == carried;

    if !verified {
        tracing::warn!(len = declared, carried, "frame checksum mismatch");
    }

    Ok(DecodedFrame {
        payload: Bytes::copy_from_slice(payload),
        checksum: carried,
        verified,
    })
}

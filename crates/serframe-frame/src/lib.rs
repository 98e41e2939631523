//! Length-prefixed, CRC-32 protected framing and paced serial delivery.
//!
//! Every frame on the wire is:
//! - A 4-byte little-endian payload length
//! - The payload itself
//! - A 4-byte little-endian CRC-32 (ISO-HDLC, as zlib computes it) of the payload
//!
//! [`ChunkedWriter`] pushes an encoded frame to a channel in bounded, paced
//! chunks; [`ReplyReader`] collects whatever the device answers within a
//! window; [`Session`] runs the whole open / drain / send / listen / close
//! sequence over one channel.

pub mod codec;
pub mod error;
pub mod reader;
pub mod record;
pub mod session;
pub mod writer;

pub use codec::{
    checksum, decode_frame, encode_frame, encode_record, DecodedFrame, HEADER_SIZE, MIN_FRAME_SIZE,
    TRAILER_SIZE,
};
pub use error::{ErrorKind, FrameError, Result};
pub use reader::{ReplyReader, DEFAULT_POLL_INTERVAL, DEFAULT_READ_SIZE};
pub use record::{ConfigRecord, BLINK_MS_MAX, BLINK_MS_MIN, MODE_MAX, MODE_MIN, RECORD_SIZE};
pub use session::{
    Session, SessionConfig, SessionReport, SessionState, DEFAULT_REPLY_TIMEOUT, DEFAULT_SETTLE_DELAY,
};
pub use writer::{ChunkedWriter, SendReport, DEFAULT_CHUNK_DELAY, DEFAULT_CHUNK_SIZE};

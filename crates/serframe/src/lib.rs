//! Send checksum-framed configuration records to devices over a serial link.
//!
//! serframe builds a small fixed-layout configuration record, wraps it in a
//! length-prefixed, CRC-32 protected frame, pushes it down a serial port in
//! paced chunks and listens briefly for whatever the device answers.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial byte channel abstraction (open, read/write, buffer resets)
//! - [`frame`]: Frame codec, configuration record, chunked writer, reply reader, session

/// Re-export transport types.
pub mod transport {
    pub use serframe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serframe_frame::*;
}

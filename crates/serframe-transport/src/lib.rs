//! Serial byte channel abstraction.
//!
//! This is the lowest layer of serframe. It wraps a platform serial port
//! (via the `serialport` crate) in a [`SerialStream`] and exposes the small
//! capability the frame layer needs through the [`ByteChannel`] trait:
//! `Read + Write` plus input/output buffer resets. Closing is `Drop`.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{available_ports, LinkConfig, PortInfo, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
pub use traits::{ByteChannel, SerialStream};

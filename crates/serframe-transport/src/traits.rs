use std::io::{Read, Write};

use serialport::{ClearBuffer, SerialPort};

use crate::error::Result;

/// A byte-oriented duplex channel with resettable buffers.
///
/// Reads may block up to the channel's own read timeout and report an empty
/// poll as `Ok(0)`, `TimedOut` or `WouldBlock`. Dropping the channel closes it.
pub trait ByteChannel: Read + Write {
    /// Discard bytes received but not yet read.
    fn clear_input(&mut self) -> Result<()>;

    /// Discard bytes written but not yet transmitted.
    fn clear_output(&mut self) -> Result<()>;

    /// Short human-readable identifier for logs.
    fn describe(&self) -> String {
        "channel".to_string()
    }
}

/// An open serial port, readable and writable.
///
/// The port is closed when the stream is dropped.
pub struct SerialStream {
    inner: Box<dyn SerialPort>,
    port: String,
}

impl SerialStream {
    pub(crate) fn from_port(inner: Box<dyn SerialPort>, port: String) -> Self {
        Self { inner, port }
    }

    /// The port name this stream was opened on.
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl ByteChannel for SerialStream {
    fn clear_input(&mut self) -> Result<()> {
        Ok(self.inner.clear(ClearBuffer::Input)?)
    }

    fn clear_output(&mut self) -> Result<()> {
        Ok(self.inner.clear(ClearBuffer::Output)?)
    }

    fn describe(&self) -> String {
        self.port().to_string()
    }
}

impl Drop for SerialStream {
    fn drop(&mut self) {
        tracing::debug!(port = %self.port, "closing serial port");
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("port", &self.port)
            .finish()
    }
}

/// Errors that can occur on the serial channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial port.
    #[error("failed to open {port} @ {baud_rate}: {source}")]
    Open {
        port: String,
        baud_rate: u32,
        source: serialport::Error,
    },

    /// A port-level control operation (buffer reset, settings) failed.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred while reading or writing.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel accepted fewer bytes than were handed to it.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// The channel has already been released.
    #[error("channel closed")]
    Closed,

    /// Serial port enumeration failed.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

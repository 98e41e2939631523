use serframe_transport::TransportError;

/// Errors that can occur while building, parsing or delivering frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A field value is outside its declared bounds.
    #[error("{field} out of bounds ({value}, expected {min}..={max})")]
    Validation {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    /// Fewer bytes than the minimum frame (header + trailer).
    #[error("frame too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },

    /// The length header disagrees with the bytes that follow it.
    #[error("length header declares {declared} payload bytes but {available} follow")]
    LengthMismatch { declared: usize, available: usize },

    /// The payload cannot be described by a 32-bit length header.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A record payload has the wrong size.
    #[error("record payload must be {expected} bytes, got {actual}")]
    RecordSize { expected: usize, actual: usize },

    /// The channel failed underneath the frame layer.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Coarse classification of a [`FrameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input values; raised before any I/O.
    Validation,
    /// Malformed frame bytes.
    Format,
    /// The channel could not be opened, written or read.
    Transport,
}

impl FrameError {
    /// Which class of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrameError::Validation { .. } => ErrorKind::Validation,
            FrameError::TooShort { .. }
            | FrameError::LengthMismatch { .. }
            | FrameError::PayloadTooLarge { .. }
            | FrameError::RecordSize { .. } => ErrorKind::Format,
            FrameError::Transport(_) => ErrorKind::Transport,
        }
    }
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::Transport(TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

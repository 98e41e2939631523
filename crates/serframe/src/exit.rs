use std::fmt;
use std::io;

use serframe_frame::FrameError;
use serframe_transport::TransportError;

// Two failure classes: the serial link, and everything else.
pub const SUCCESS: i32 = 0;
pub const TRANSPORT_ERROR: i32 = 2;
pub const FAILURE: i32 = 3;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(FAILURE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Local file I/O (payload files, stdout); never the serial link.
pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let hint = match &err {
        TransportError::Open { .. } => {
            "\ncheck the port name, that nothing else holds it open, and that the target is powered"
        }
        _ => "",
    };
    CliError::new(TRANSPORT_ERROR, format!("{context}: {err}{hint}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

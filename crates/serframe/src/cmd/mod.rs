use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use serframe_frame::ConfigRecord;

use crate::exit::{io_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a configuration frame and print the device reply.
    Send(SendArgs),
    /// Print the frame that `send` would transmit.
    Encode(EncodeArgs),
    /// Decode and verify a hex-encoded frame.
    Decode(DecodeArgs),
    /// List serial ports on this host.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Fields of the configuration record.
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Configuration layout version.
    #[arg(long, default_value_t = 2)]
    pub config_version: u32,
    /// LED blink period in milliseconds (100..=5000).
    #[arg(long, default_value_t = 300)]
    pub blink_ms: u16,
    /// Device operating mode.
    #[arg(long, default_value_t = 1)]
    pub mode: u8,
    /// Reserved byte, sent as-is.
    #[arg(long, default_value_t = 0)]
    pub reserved: u8,
    /// Frame the contents of a file instead of a configuration record.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["config_version", "blink_ms", "mode", "reserved"])]
    pub file: Option<PathBuf>,
}

impl RecordArgs {
    pub fn record(&self) -> ConfigRecord {
        ConfigRecord {
            version: self.config_version,
            blink_ms: self.blink_ms,
            mode: self.mode,
            reserved: self.reserved,
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial port to open (e.g. /dev/ttyUSB0, COM17).
    #[arg(env = "SERFRAME_PORT")]
    pub port: String,
    /// Line speed in baud.
    #[arg(long, env = "SERFRAME_BAUD", default_value_t = serframe_transport::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Maximum bytes per write.
    #[arg(long, env = "SERFRAME_CHUNK_SIZE", default_value_t = serframe_frame::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Pause between chunks (e.g. 2ms, 0ms).
    #[arg(long, env = "SERFRAME_CHUNK_DELAY", default_value = "2ms")]
    pub chunk_delay: String,
    /// Pause after opening the port, before draining it.
    #[arg(long, env = "SERFRAME_SETTLE_DELAY", default_value = "50ms")]
    pub settle_delay: String,
    /// How long to listen for a device reply (e.g. 2s, 500ms).
    #[arg(long, env = "SERFRAME_REPLY_TIMEOUT", default_value = "2s")]
    pub reply_timeout: String,
    /// Per-read blocking bound on the port.
    #[arg(long, env = "SERFRAME_READ_TIMEOUT", default_value = "100ms")]
    pub read_timeout: String,
    /// Pause after a poll that read nothing.
    #[arg(long, default_value = "50ms")]
    pub poll_interval: String,
    #[command(flatten)]
    pub record: RecordArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub record: RecordArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex; spaces and colons are ignored.
    pub hex: String,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Build the frame for either a payload file or the record flags.
pub fn build_frame(args: &RecordArgs) -> CliResult<Vec<u8>> {
    let frame = match &args.file {
        Some(path) => {
            let payload = std::fs::read(path).map_err(|err| {
                io_error(&format!("failed reading {}", path.display()), err)
            })?;
            let mut buf = bytes::BytesMut::new();
            serframe_frame::encode_frame(&payload, &mut buf)
                .map_err(|err| crate::exit::frame_error("invalid payload", err))?;
            buf.to_vec()
        }
        None => serframe_frame::encode_record(&args.record())
            .map_err(|err| crate::exit::frame_error("invalid record", err))?
            .to_vec(),
    };
    Ok(frame)
}

/// Parse `500ms`, `2s` or a bare number of seconds. Zero is allowed.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

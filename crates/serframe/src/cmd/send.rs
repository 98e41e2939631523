use serframe_frame::{Session, SessionConfig};
use serframe_transport::LinkConfig;
use tracing::info;

use crate::cmd::{build_frame, parse_duration, SendArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_session, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let config = session_config(&args)?;
    config
        .validate()
        .map_err(|err| frame_error("invalid session settings", err))?;
    let frame = build_frame(&args.record)?;

    info!(port = %config.link.port, baud = config.link.baud_rate, "opening serial port");
    let mut session =
        Session::open_serial(config).map_err(|err| frame_error("open failed", err))?;
    let report = session
        .exchange(&frame)
        .map_err(|err| frame_error("send failed", err))?;

    print_session(&report, &args.port, format);
    Ok(SUCCESS)
}

fn session_config(args: &SendArgs) -> CliResult<SessionConfig> {
    Ok(SessionConfig {
        link: LinkConfig {
            port: args.port.clone(),
            baud_rate: args.baud,
            read_timeout: parse_duration(&args.read_timeout)?,
        },
        chunk_size: args.chunk_size,
        chunk_delay: parse_duration(&args.chunk_delay)?,
        settle_delay: parse_duration(&args.settle_delay)?,
        reply_timeout: parse_duration(&args.reply_timeout)?,
        poll_interval: parse_duration(&args.poll_interval)?,
        ..SessionConfig::new(args.port.clone())
    })
}

use serframe_frame::decode_frame;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;
    let decoded = decode_frame(&bytes).map_err(|err| frame_error("decode failed", err))?;
    print_decoded(&decoded, format);

    // The frame is printed either way; a bad checksum only changes the exit code.
    if decoded.verified {
        Ok(SUCCESS)
    } else {
        eprintln!("error: checksum mismatch");
        Ok(FAILURE)
    }
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && *c != ':')
        .collect();
    let compact = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);

    hex::decode(compact).map_err(|err| CliError::usage(format!("invalid hex frame: {err}")))
}

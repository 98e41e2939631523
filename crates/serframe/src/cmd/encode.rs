use crate::cmd::{build_frame, EncodeArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = build_frame(&args.record)?;
    print_encoded(&frame, format);
    Ok(SUCCESS)
}

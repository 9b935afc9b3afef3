use crate::cmd::PrintCmdArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: PrintCmdArgs) -> CliResult<i32> {
    let command = args.encoder.to_command();
    println!("{} {}", args.encoder.ffmpeg.display(), command.args());
    Ok(SUCCESS)
}

use std::fs::File;
use std::io::{BufWriter, Write};

use flvpipe_driver::{run_pipeline, PipelineConfig};
use flvpipe_spawn::{SpawnOptions, SubprocessChannel};
use tracing::info;

use crate::cmd::EncodeArgs;
use crate::exit::{driver_error, io_error, spawn_error, CliResult, FAILURE, SUCCESS};
use crate::testsrc::TestFrames;

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let command = args.encoder.to_command();
    let frames = TestFrames::new(args.encoder.width, args.encoder.height, args.frames);

    let options = SpawnOptions {
        program: args.encoder.ffmpeg.clone(),
        args: command.args(),
        pipe_stdin: true,
        pipe_stdout: true,
        pipe_buffer_size: args.pipe_buffer_size,
    };
    let mut channel = SubprocessChannel::spawn(&options)
        .map_err(|err| spawn_error("failed to start encoder", err))?;

    let config = PipelineConfig {
        latency_offset: args.latency,
        start_code_policy: args.start_codes.into(),
        frame_size: Some(command.frame_size()),
    };

    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|err| {
            io_error(&format!("failed to create {}", path.display()), err)
        })?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let stats = run_pipeline(&mut channel, frames, &config, &mut sink)
        .map_err(|err| driver_error("encode session failed", err))?;
    sink.flush()
        .map_err(|err| io_error("failed to flush output", err))?;

    info!(
        frames = stats.frames_written,
        payloads = stats.payloads_read,
        bytes_out = stats.bytes_out,
        "stream written"
    );

    Ok(if stats.encoder_success {
        SUCCESS
    } else {
        FAILURE
    })
}

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use flvpipe_demux::StartCodePolicy;
use flvpipe_driver::EncoderCommand;

use crate::exit::CliResult;

pub mod encode;
pub mod print_cmd;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode synthetic frames through the external encoder and emit
    /// an Annex B elementary stream.
    Encode(EncodeArgs),
    /// Print the encoder command line that would be spawned.
    PrintCmd(PrintCmdArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::PrintCmd(args) => print_cmd::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Encoder settings shared by `encode` and `print-cmd`.
#[derive(Args, Debug)]
pub struct EncoderArgs {
    /// Frame width in pixels.
    #[arg(long)]
    pub width: u32,
    /// Frame height in pixels.
    #[arg(long)]
    pub height: u32,
    /// Input frame rate.
    #[arg(long, default_value = "25")]
    pub fps: u32,
    /// Raw input pixel format.
    #[arg(long, default_value = "bgr24")]
    pub pixel_format: String,
    /// GOP size (keyframe interval).
    #[arg(long, default_value = "10")]
    pub gop: u32,
    /// Number of B-frames. Non-zero values need a matching --latency.
    #[arg(long, default_value = "0")]
    pub bframes: u32,
    /// Constant rate factor.
    #[arg(long, default_value = "10")]
    pub crf: u32,
    /// Encoder executable (resolved via PATH if not absolute).
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,
}

impl EncoderArgs {
    pub fn to_command(&self) -> EncoderCommand {
        let mut command = EncoderCommand::new(self.width, self.height, self.fps);
        command.input_pixel_format = self.pixel_format.clone();
        command.gop = self.gop;
        command.bframes = self.bframes;
        command.crf = self.crf;
        if self.bframes > 0 {
            // The zero-lookahead parameter set forces bframes=0; it cannot
            // coexist with an explicit B-frame request.
            command.x264_params = None;
        }
        command
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub encoder: EncoderArgs,
    /// Number of synthetic frames to feed.
    #[arg(long, default_value = "100")]
    pub frames: usize,
    /// Frames the encoder buffers before its first output payload.
    #[arg(long, default_value = "0")]
    pub latency: usize,
    /// Requested pipe capacity in bytes (Linux, best-effort).
    #[arg(long)]
    pub pipe_buffer_size: Option<usize>,
    /// Start-code habit to reproduce.
    #[arg(long, value_enum, default_value = "x264")]
    pub start_codes: StartCodes,
    /// Output file for the Annex B stream (stdout if omitted).
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PrintCmdArgs {
    #[command(flatten)]
    pub encoder: EncoderArgs,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum StartCodes {
    X264,
    Quicksync,
}

impl From<StartCodes> for StartCodePolicy {
    fn from(value: StartCodes) -> Self {
        match value {
            StartCodes::X264 => StartCodePolicy::X264,
            StartCodes::Quicksync => StartCodePolicy::QuickSync,
        }
    }
}

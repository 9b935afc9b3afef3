use std::fmt;

use flvpipe_demux::DemuxError;
use flvpipe_driver::DriverError;
use flvpipe_spawn::SpawnError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const SPAWN_FAILED: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

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
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: std::io::Error) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn spawn_error(context: &str, err: SpawnError) -> CliError {
    CliError::new(spawn_code(&err), format!("{context}: {err}"))
}

pub fn demux_error(context: &str, err: DemuxError) -> CliError {
    CliError::new(demux_code(&err), format!("{context}: {err}"))
}

pub fn driver_error(context: &str, err: DriverError) -> CliError {
    let code = match &err {
        DriverError::Channel { source, .. } => spawn_code(source),
        DriverError::Demux { source, .. } => demux_code(source),
        DriverError::Sink { .. } => FAILURE,
        DriverError::FrameSize { .. } => USAGE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

fn spawn_code(err: &SpawnError) -> i32 {
    match err {
        SpawnError::Spawn { .. } => SPAWN_FAILED,
        SpawnError::Write(_)
        | SpawnError::Read(_)
        | SpawnError::UnexpectedEof { .. }
        | SpawnError::Wait(_) => FAILURE,
        SpawnError::InputClosed | SpawnError::MissingPipe(_) => INTERNAL,
    }
}

fn demux_code(err: &DemuxError) -> i32 {
    match err {
        DemuxError::Io(_) | DemuxError::UnexpectedEof => FAILURE,
        _ => DATA_INVALID,
    }
}

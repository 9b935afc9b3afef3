use std::path::PathBuf;

/// Errors that can occur on a subprocess channel.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The child process could not be created or its pipes wired.
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    /// A write on the child's input pipe failed.
    #[error("write to child stdin failed: {0}")]
    Write(#[from] std::io::Error),

    /// A read on the child's output pipe failed.
    #[error("read from child stdout failed: {0}")]
    Read(std::io::Error),

    /// The child closed its output before delivering the requested bytes.
    #[error("child process ended unexpectedly ({got} of {wanted} bytes read)")]
    UnexpectedEof { wanted: usize, got: usize },

    /// The input side has already been half-closed.
    #[error("child stdin already closed")]
    InputClosed,

    /// The requested pipe was not opened at spawn time.
    #[error("channel has no {0} pipe")]
    MissingPipe(&'static str),

    /// Waiting for the child process to terminate failed.
    #[error("failed to wait for child process: {0}")]
    Wait(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpawnError>;

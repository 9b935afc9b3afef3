use flvpipe_demux::DemuxError;
use flvpipe_spawn::SpawnError;

/// The linear phases of an encode session, used to name where a failure
/// occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First frame written, stream header not yet consumed.
    Priming,
    /// Interleaved frame writes and payload reads.
    Steady,
    /// Input closed, collecting the encoder's buffered payloads.
    Draining,
    /// Trailer handling and process reap.
    Finalizing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Priming => "priming",
            Phase::Steady => "steady",
            Phase::Draining => "draining",
            Phase::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// Errors that abort an encode session.
///
/// All of these are terminal: the driver stops the remaining loop,
/// releases the encoder, and reports the single failure.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A subprocess channel operation failed.
    #[error("channel failure during {phase}: {source}")]
    Channel { phase: Phase, source: SpawnError },

    /// The container stream violated a structural precondition.
    #[error("container failure during {phase}: {source}")]
    Demux { phase: Phase, source: DemuxError },

    /// Writing re-framed output to the sink failed.
    #[error("sink failure during {phase}: {source}")]
    Sink {
        phase: Phase,
        source: std::io::Error,
    },

    /// A raw frame did not match the configured geometry.
    #[error("frame {index} has {got} bytes (expected {expected})")]
    FrameSize {
        index: usize,
        expected: usize,
        got: usize,
    },
}

impl DriverError {
    pub(crate) fn channel(phase: Phase) -> impl FnOnce(SpawnError) -> Self {
        move |source| Self::Channel { phase, source }
    }

    pub(crate) fn demux(phase: Phase) -> impl FnOnce(DemuxError) -> Self {
        move |source| Self::Demux { phase, source }
    }

    pub(crate) fn sink(phase: Phase) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Sink { phase, source }
    }

    /// The phase the session was in when it failed, if the failure is
    /// phase-scoped.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Channel { phase, .. } | Self::Demux { phase, .. } | Self::Sink { phase, .. } => {
                Some(*phase)
            }
            Self::FrameSize { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;

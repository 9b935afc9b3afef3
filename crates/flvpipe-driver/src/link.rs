use std::io::Read;

use flvpipe_spawn::{SpawnError, SubprocessChannel};

/// The seam between the driver and whatever plays the encoder.
///
/// Production code runs against a [`SubprocessChannel`]; tests substitute
/// a stub that serves pre-built container bytes.
pub trait EncoderLink {
    /// Submit one raw frame to the encoder's input.
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), SpawnError>;

    /// The encoder's container output stream.
    fn output(&mut self) -> &mut dyn Read;

    /// Half-close the input side, signalling "no more frames, flush and
    /// finalize".
    fn finish_input(&mut self) -> Result<(), SpawnError>;

    /// Wait for the encoder to terminate; returns whether it exited
    /// successfully. Called exactly once, after all I/O is done (or on
    /// the failure path as best-effort release).
    fn wait(&mut self) -> Result<bool, SpawnError>;
}

impl EncoderLink for SubprocessChannel {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), SpawnError> {
        self.write_exact(frame)
    }

    fn output(&mut self) -> &mut dyn Read {
        self
    }

    fn finish_input(&mut self) -> Result<(), SpawnError> {
        self.close_input()
    }

    fn wait(&mut self) -> Result<bool, SpawnError> {
        self.wait_and_close().map(|status| status.success())
    }
}

use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{Result, SpawnError};

/// How to launch the external encoder process.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// Path (or name resolved via `PATH`) of the executable.
    pub program: PathBuf,
    /// Arguments as a single space-delimited string.
    ///
    /// Arguments containing embedded spaces are not supported; the string
    /// is split on whitespace before launch.
    pub args: String,
    /// Wire a pipe to the child's stdin.
    pub pipe_stdin: bool,
    /// Wire a pipe to the child's stdout.
    pub pipe_stdout: bool,
    /// Requested pipe capacity in bytes (honored on Linux, best-effort).
    ///
    /// The capacity must exceed the peak in-flight backlog (roughly
    /// `latency_offset` encoded payloads on the output side plus one raw
    /// frame on the input side), or the blocking interleave can deadlock
    /// against a child blocked on a full pipe.
    pub pipe_buffer_size: Option<usize>,
}

impl SpawnOptions {
    /// Options for `program` with both pipes wired and no capacity hint.
    pub fn new(program: impl Into<PathBuf>, args: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: args.into(),
            pipe_stdin: true,
            pipe_stdout: true,
            pipe_buffer_size: None,
        }
    }
}

/// A spawned child process with exclusive ownership of its pipe ends.
///
/// At most one channel exists per spawned process. Dropping the channel
/// without calling [`wait_and_close`](Self::wait_and_close) closes the
/// pipes but leaks the process table entry until the parent exits.
pub struct SubprocessChannel {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    program: PathBuf,
}

impl SubprocessChannel {
    /// Spawn the child and wire the requested pipes.
    ///
    /// Unused standard streams are inherited from the parent. The child's
    /// ends of the wired pipes are owned by the child; the parent keeps
    /// exactly one descriptor per wired direction.
    pub fn spawn(options: &SpawnOptions) -> Result<Self> {
        let mut command = Command::new(&options.program);
        command.args(options.args.split_whitespace());
        command.stdin(if options.pipe_stdin {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        command.stdout(if options.pipe_stdout {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });

        let mut child = command.spawn().map_err(|source| SpawnError::Spawn {
            program: options.program.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();

        debug!(program = %options.program.display(), pid = child.id(), "spawned child process");

        let channel = Self {
            child,
            stdin,
            stdout,
            program: options.program.clone(),
        };

        if let Some(capacity) = options.pipe_buffer_size {
            channel.request_pipe_capacity(capacity);
        }

        Ok(channel)
    }

    /// Write the entire buffer to the child's stdin.
    ///
    /// Partial writes are retried until all bytes are written or the call
    /// fails. A broken pipe (child exited) surfaces as
    /// [`SpawnError::Write`]; the bytes already written are not undone.
    pub fn write_exact(&mut self, buf: &[u8]) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(SpawnError::InputClosed)?;

        let mut offset = 0usize;
        while offset < buf.len() {
            match stdin.write(&buf[offset..]) {
                Ok(0) => {
                    return Err(SpawnError::Write(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "child stdin accepted zero bytes",
                    )))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(SpawnError::Write(err)),
            }
        }

        loop {
            match stdin.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SpawnError::Write(err)),
            }
        }
    }

    /// Read exactly `buf.len()` bytes from the child's stdout.
    ///
    /// Blocks until the buffer is full. If the child closes its output
    /// first, fails with [`SpawnError::UnexpectedEof`] carrying the byte
    /// counts; a short buffer is never returned silently.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let stdout = self
            .stdout
            .as_mut()
            .ok_or(SpawnError::MissingPipe("stdout"))?;

        let mut filled = 0usize;
        while filled < buf.len() {
            match stdout.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(SpawnError::UnexpectedEof {
                        wanted: buf.len(),
                        got: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SpawnError::Read(err)),
            }
        }
        Ok(())
    }

    /// Half-close the input side.
    ///
    /// Dropping the stdin descriptor delivers EOF to the child, which is
    /// the signal for "no more frames, flush and finalize". Output
    /// already buffered by the child remains readable afterward. Fails
    /// with [`SpawnError::InputClosed`] if already closed (or never wired).
    pub fn close_input(&mut self) -> Result<()> {
        match self.stdin.take() {
            Some(stdin) => {
                drop(stdin);
                debug!(program = %self.program.display(), "closed child stdin");
                Ok(())
            }
            None => Err(SpawnError::InputClosed),
        }
    }

    /// Whether the input side is still open for writing.
    pub fn input_open(&self) -> bool {
        self.stdin.is_some()
    }

    /// Close all remaining pipe ends and wait for the child to terminate.
    ///
    /// Must be called after all reads and writes are finished: waiting
    /// while the child is still blocked writing into a full output pipe
    /// deadlocks.
    pub fn wait_and_close(&mut self) -> Result<ExitStatus> {
        drop(self.stdin.take());
        drop(self.stdout.take());
        let status = self.child.wait().map_err(SpawnError::Wait)?;
        debug!(program = %self.program.display(), %status, "child process terminated");
        Ok(status)
    }

    /// Process id of the child.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    #[cfg(target_os = "linux")]
    fn request_pipe_capacity(&self, capacity: usize) {
        use std::os::fd::AsRawFd;

        use tracing::warn;

        if let Some(stdin) = &self.stdin {
            match crate::pipe::set_pipe_capacity(stdin.as_raw_fd(), capacity) {
                Ok(actual) => debug!(requested = capacity, actual, "resized stdin pipe"),
                Err(err) => warn!(requested = capacity, %err, "could not resize stdin pipe"),
            }
        }
        if let Some(stdout) = &self.stdout {
            match crate::pipe::set_pipe_capacity(stdout.as_raw_fd(), capacity) {
                Ok(actual) => debug!(requested = capacity, actual, "resized stdout pipe"),
                Err(err) => warn!(requested = capacity, %err, "could not resize stdout pipe"),
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn request_pipe_capacity(&self, capacity: usize) {
        debug!(
            requested = capacity,
            "pipe capacity hint ignored on this platform"
        );
    }
}

/// The channel reads as the child's stdout stream.
///
/// Lets the demux layer consume container output through any `R: Read`
/// without knowing about processes.
impl Read for SubprocessChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.stdout.as_mut() {
            Some(stdout) => stdout.read(buf),
            None => Err(std::io::Error::new(
                ErrorKind::NotConnected,
                "channel has no stdout pipe",
            )),
        }
    }
}

impl std::fmt::Debug for SubprocessChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubprocessChannel")
            .field("program", &self.program)
            .field("pid", &self.child.id())
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn cat_channel() -> SubprocessChannel {
        SubprocessChannel::spawn(&SpawnOptions::new("cat", "")).unwrap()
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_through_cat() {
        let mut channel = cat_channel();

        channel.write_exact(b"twelve bytes").unwrap();
        let mut buf = [0u8; 12];
        channel.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"twelve bytes");

        channel.close_input().unwrap();
        let status = channel.wait_and_close().unwrap();
        assert!(status.success());
    }

    #[test]
    #[cfg(unix)]
    fn read_exact_spans_multiple_writes() {
        let mut channel = cat_channel();

        channel.write_exact(b"abc").unwrap();
        channel.write_exact(b"defgh").unwrap();

        let mut buf = [0u8; 8];
        channel.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abcdefgh");

        channel.close_input().unwrap();
        channel.wait_and_close().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn short_delivery_is_unexpected_eof() {
        let mut channel = cat_channel();

        channel.write_exact(b"abc").unwrap();
        channel.close_input().unwrap();

        let mut buf = [0u8; 10];
        let err = channel.read_exact(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            SpawnError::UnexpectedEof { wanted: 10, got: 3 }
        ));

        channel.wait_and_close().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn write_after_close_input_rejected() {
        let mut channel = cat_channel();

        channel.close_input().unwrap();
        assert!(!channel.input_open());

        let err = channel.write_exact(b"late").unwrap_err();
        assert!(matches!(err, SpawnError::InputClosed));

        let err = channel.close_input().unwrap_err();
        assert!(matches!(err, SpawnError::InputClosed));

        channel.wait_and_close().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn read_survives_input_close() {
        let mut channel = cat_channel();

        channel.write_exact(b"buffered").unwrap();
        channel.close_input().unwrap();

        // Output written before the half-close stays readable.
        let mut buf = [0u8; 8];
        channel.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"buffered");

        channel.wait_and_close().unwrap();
    }

    #[test]
    fn spawn_missing_program_fails() {
        let options = SpawnOptions::new("flvpipe-no-such-executable", "");
        let err = SubprocessChannel::spawn(&options).unwrap_err();
        assert!(matches!(err, SpawnError::Spawn { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn args_split_on_whitespace() {
        let mut channel =
            SubprocessChannel::spawn(&SpawnOptions::new("printf", "%s-%s one two")).unwrap();

        let mut buf = [0u8; 7];
        channel.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"one-two");

        channel.close_input().unwrap();
        channel.wait_and_close().unwrap();
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn pipe_capacity_hint_applies() {
        let mut options = SpawnOptions::new("cat", "");
        options.pipe_buffer_size = Some(256 * 1024);
        let mut channel = SubprocessChannel::spawn(&options).unwrap();

        // The hint is best-effort; the channel must stay usable either way.
        channel.write_exact(b"ok").unwrap();
        let mut buf = [0u8; 2];
        channel.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ok");

        channel.close_input().unwrap();
        channel.wait_and_close().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn read_trait_delegates_to_stdout() {
        let mut channel = cat_channel();

        channel.write_exact(b"xyz").unwrap();
        channel.close_input().unwrap();

        let mut collected = Vec::new();
        channel.read_to_end(&mut collected).unwrap();
        assert_eq!(collected, b"xyz");

        channel.wait_and_close().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn spawn_without_stdout_pipe() {
        let mut options = SpawnOptions::new("true", "");
        options.pipe_stdin = false;
        options.pipe_stdout = false;
        let mut channel = SubprocessChannel::spawn(&options).unwrap();

        let mut buf = [0u8; 1];
        let err = channel.read_exact(&mut buf).unwrap_err();
        assert!(matches!(err, SpawnError::MissingPipe("stdout")));

        let status = channel.wait_and_close().unwrap();
        assert!(status.success());
    }
}

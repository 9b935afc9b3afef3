//! Subprocess channel for driving an external encoder over pipes.
//!
//! This is the lowest layer of flvpipe. It spawns a child process with up
//! to two unidirectional pipes (parent → child stdin, child stdout →
//! parent) and provides the blocking primitives the rest of the pipeline
//! is built on:
//!
//! - exact-length write (partial writes are retried internally)
//! - exact-length read (a short delivery is an error, never a short buffer)
//! - explicit half-close of the input side (the "flush and finalize" signal
//!   understood by encoders reading from stdin)
//!
//! The channel is the sole owner of its pipe descriptors and must be reaped
//! exactly once via [`SubprocessChannel::wait_and_close`].

pub mod channel;
pub mod error;

#[cfg(target_os = "linux")]
mod pipe;

pub use channel::{SpawnOptions, SubprocessChannel};
pub use error::{Result, SpawnError};

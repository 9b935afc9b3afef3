//! Drives one encode session end to end.
//!
//! The driver owns the sequencing contract of the pipeline: prime the
//! encoder with the first frame and the one-time stream header read,
//! interleave frame writes with payload reads once the encoder's fixed
//! output latency has elapsed, drain the frames still buffered inside the
//! encoder after input close, and consume the optional stream trailer.
//!
//! Everything is blocking on one logical thread. That is only safe under
//! the latency contract: the pipe buffers must absorb up to
//! `latency_offset` encoded payloads of backlog (see
//! [`pipeline::PipelineConfig::latency_offset`]).

pub mod encoder;
pub mod error;
pub mod link;
pub mod pipeline;

pub use encoder::EncoderCommand;
pub use error::{DriverError, Phase, Result};
pub use link::EncoderLink;
pub use pipeline::{run_pipeline, PipelineConfig, Stats};

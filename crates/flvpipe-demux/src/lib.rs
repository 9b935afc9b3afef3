//! Streaming demuxer for the FLV output of a pipe-driven encoder.
//!
//! The encoder emits H.264 inside an FLV container because FLV carries an
//! explicit payload size per tag, the one piece of information a pipe
//! reader cannot recover from a bare elementary stream. This crate walks
//! that container one tag at a time over any `Read`:
//!
//! - 9-byte stream header (validated exactly: magic, version, video-only)
//! - 15-byte tag envelope carrying a 3-byte big-endian payload length
//! - 5-byte video sub-header (AVC codec id, NALU packet kind)
//! - back-to-back AVCC NAL units (`[u32 BE length][data]`)
//!
//! Each NAL unit is re-framed with an Annex B start code and concatenated
//! into one output buffer per tag. Every structural precondition violation
//! is fatal; there is no resynchronization with a malformed stream.

pub mod annexb;
pub mod error;
pub mod flv;

pub use annexb::{demux_payload, StartCodePolicy, LONG_START_CODE, SHORT_START_CODE};
pub use error::{DemuxError, Result};
pub use flv::{
    read_stream_header, read_stream_header_and_first_payload, read_tag_header, read_trailer,
    STREAM_SIGNATURE, TAG_HEADER_SIZE, TRAILER_SIZE,
};

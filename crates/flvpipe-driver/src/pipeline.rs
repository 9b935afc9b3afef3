use std::io::Write;

use bytes::Bytes;
use flvpipe_demux::{
    demux_payload, read_stream_header_and_first_payload, read_tag_header, read_trailer,
    StartCodePolicy,
};
use tracing::{debug, info, warn};

use crate::error::{DriverError, Phase, Result};
use crate::link::EncoderLink;

/// Session parameters the caller must supply.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How many frames the encoder buffers before its first payload
    /// appears on the output pipe.
    ///
    /// This depends on the encoder's lookahead/B-frame settings and must
    /// be supplied, never inferred: reading too early blocks forever,
    /// writing too far ahead overflows the pipe and deadlocks. With the
    /// default zero-lookahead encoder settings the value is 0.
    pub latency_offset: usize,
    /// Which NAL unit types get the 3-byte start code.
    pub start_code_policy: StartCodePolicy,
    /// Expected raw frame size in bytes; frames of any other length are
    /// rejected before being written.
    pub frame_size: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            latency_offset: 0,
            start_code_policy: StartCodePolicy::default(),
            frame_size: None,
        }
    }
}

/// Counters reported after a completed session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Raw frames written to the encoder.
    pub frames_written: usize,
    /// Tag payloads read back and re-framed.
    pub payloads_read: usize,
    /// Annex B bytes forwarded to the sink.
    pub bytes_out: usize,
    /// Whether the 4-byte stream trailer was present.
    pub trailer_present: bool,
    /// Whether the encoder process exited successfully.
    pub encoder_success: bool,
}

/// Run one encode session over `link`, writing re-framed Annex B output
/// to `sink`.
///
/// Phases run linearly: prime (first frame + one-time header read),
/// steady interleave, drain after input close, finalize. Any failure
/// aborts the remaining loop, still releases the encoder, and surfaces as
/// the single terminal error.
///
/// On success every frame written has had its payload read back: reads
/// total `frames - latency_offset` during steady state and the remainder
/// during drain.
pub fn run_pipeline<L, I, W>(
    link: &mut L,
    frames: I,
    config: &PipelineConfig,
    sink: &mut W,
) -> Result<Stats>
where
    L: EncoderLink,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
    W: Write + ?Sized,
{
    match drive(link, frames, config, sink) {
        Ok(stats) => Ok(stats),
        Err(err) => {
            // Best-effort release on the failure path; the original error
            // is the one reported.
            warn!(%err, "pipeline aborted, releasing encoder");
            if let Err(wait_err) = link.wait() {
                warn!(%wait_err, "could not reap encoder after failure");
            }
            Err(err)
        }
    }
}

fn drive<L, I, W>(link: &mut L, frames: I, config: &PipelineConfig, sink: &mut W) -> Result<Stats>
where
    L: EncoderLink,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
    W: Write + ?Sized,
{
    let mut stats = Stats::default();
    let mut phase = Phase::Priming;

    for (index, frame) in frames.into_iter().enumerate() {
        let frame = frame.as_ref();
        if let Some(expected) = config.frame_size {
            if frame.len() != expected {
                return Err(DriverError::FrameSize {
                    index,
                    expected,
                    got: frame.len(),
                });
            }
        }

        link.send_frame(frame).map_err(DriverError::channel(phase))?;
        stats.frames_written += 1;

        if index == 0 {
            // The header and start-of-stream tag appear once the encoder
            // has seen input; consume them before any payload reads.
            read_stream_header_and_first_payload(link.output())
                .map_err(DriverError::demux(phase))?;
            debug!("stream header consumed");
            phase = Phase::Steady;
        }

        if index >= config.latency_offset {
            forward_one_payload(link, config, sink, phase, &mut stats)?;
        }
    }

    phase = Phase::Draining;
    if stats.frames_written > 0 {
        link.finish_input().map_err(DriverError::channel(phase))?;
        debug!(
            owed = stats.frames_written - stats.payloads_read,
            "input closed, draining encoder"
        );
    }

    // The encoder flushes its buffered frames after input close; read
    // until every written frame has produced a payload.
    while stats.payloads_read < stats.frames_written {
        forward_one_payload(link, config, sink, phase, &mut stats)?;
    }

    phase = Phase::Finalizing;
    stats.trailer_present = read_trailer(link.output());

    stats.encoder_success = link.wait().map_err(DriverError::channel(phase))?;
    if !stats.encoder_success {
        warn!("encoder exited with failure status");
    }

    info!(
        frames = stats.frames_written,
        payloads = stats.payloads_read,
        bytes_out = stats.bytes_out,
        "encode session complete"
    );
    Ok(stats)
}

fn forward_one_payload<L, W>(
    link: &mut L,
    config: &PipelineConfig,
    sink: &mut W,
    phase: Phase,
    stats: &mut Stats,
) -> Result<()>
where
    L: EncoderLink,
    W: Write + ?Sized,
{
    let payload = read_one_payload(link, config.start_code_policy, phase)?;
    sink.write_all(&payload).map_err(DriverError::sink(phase))?;
    stats.payloads_read += 1;
    stats.bytes_out += payload.len();
    Ok(())
}

fn read_one_payload<L: EncoderLink>(
    link: &mut L,
    policy: StartCodePolicy,
    phase: Phase,
) -> Result<Bytes> {
    let output = link.output();
    let declared_len = read_tag_header(output).map_err(DriverError::demux(phase))?;
    demux_payload(output, declared_len as usize, policy).map_err(DriverError::demux(phase))
}

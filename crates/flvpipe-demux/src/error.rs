/// Errors raised while demuxing the container stream.
///
/// Everything here is fatal to the pipeline run: the demuxer makes no
/// attempt to resynchronize with a malformed stream.
#[derive(Debug, thiserror::Error)]
pub enum DemuxError {
    /// The stream does not begin with the `FLV` signature.
    #[error("bad stream signature {0:02x?} (expected \"FLV\")")]
    BadSignature([u8; 3]),

    /// The header version byte is not the supported value 1.
    #[error("unsupported container version {0} (expected 1)")]
    BadVersion(u8),

    /// The header flags byte does not declare video-only content.
    #[error("unsupported stream flags {0:#04x} (expected 0x01, video only)")]
    BadFlags(u8),

    /// The payload's codec id is not AVC.
    #[error("codec id {0} is not AVC (expected 7)")]
    UnsupportedCodec(u8),

    /// The payload's packet kind is not a coded NALU packet.
    #[error("packet kind {0} is not a NALU packet (expected 1)")]
    UnsupportedPacketKind(u8),

    /// A NAL length field claims more bytes than the payload has left.
    #[error("NAL unit length {nal_len} overruns payload ({remaining} bytes remaining)")]
    NalOverrun { nal_len: usize, remaining: usize },

    /// The payload ended with bytes that cannot hold another NAL unit.
    #[error("payload truncated ({remaining} trailing bytes, too short for a NAL unit)")]
    TruncatedPayload { remaining: usize },

    /// A NAL unit with a declared length of zero carries no type byte.
    #[error("zero-length NAL unit")]
    EmptyNal,

    /// The stream ended before delivering the requested bytes.
    #[error("stream ended mid-structure")]
    UnexpectedEof,

    /// An I/O error occurred while reading the stream.
    #[error("demux I/O error: {0}")]
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, DemuxError>;

/// Map a `read_exact` failure: EOF means the peer closed mid-structure,
/// anything else is a transport fault.
pub(crate) fn from_read_error(err: std::io::Error) -> DemuxError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        DemuxError::UnexpectedEof
    } else {
        DemuxError::Io(err)
    }
}

//! AVCC → Annex B re-framing of one tag payload.

use std::io::Read;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{from_read_error, DemuxError, Result};

/// 3-byte Annex B start code.
pub const SHORT_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// 4-byte Annex B start code.
pub const LONG_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Video sub-header: frame type + codec id (1) + packet kind (1)
/// + composition time (3).
const SUBHEADER_SIZE: usize = 5;

/// AVCC length prefix in front of every NAL unit.
const NAL_LENGTH_SIZE: usize = 4;

const CODEC_ID_AVC: u8 = 7;
const PACKET_KIND_NALU: u8 = 1;

/// Which NAL unit types get the 3-byte start code.
///
/// Encoders disagree on when to emit the short form in their own native
/// Annex B output; the policy reproduces the chosen encoder's habit so the
/// re-framed stream byte-matches it. This is a compatibility rule, not a
/// format requirement; both start codes are valid Annex B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartCodePolicy {
    /// libx264: short code for IDR slices (5) and SEI (6).
    #[default]
    X264,
    /// Intel Quick Sync: short code for IDR (5) and non-IDR (1) slices.
    QuickSync,
}

impl StartCodePolicy {
    /// Whether a NAL unit whose first data byte is `first_byte` gets the
    /// 3-byte start code. Only the low 4 bits (the NAL unit type) matter.
    pub fn uses_short_code(self, first_byte: u8) -> bool {
        let nal_type = first_byte & 0x0F;
        match self {
            StartCodePolicy::X264 => matches!(nal_type, 5 | 6),
            StartCodePolicy::QuickSync => matches!(nal_type, 5 | 1),
        }
    }

    /// The start code to prefix a NAL unit with.
    pub fn start_code(self, first_byte: u8) -> &'static [u8] {
        if self.uses_short_code(first_byte) {
            &SHORT_START_CODE
        } else {
            &LONG_START_CODE
        }
    }
}

/// Consume one tag payload of `declared_len` bytes and return its NAL
/// units re-framed with Annex B start codes, in encountered order.
///
/// The payload is a 5-byte sub-header followed by back-to-back AVCC
/// records (`[u32 BE length][data]`) with no padding. Bytes consumed must
/// equal `declared_len` exactly; any shortfall or overrun of a length
/// field against the remaining room is a fatal format violation.
pub fn demux_payload<R: Read + ?Sized>(
    reader: &mut R,
    declared_len: usize,
    policy: StartCodePolicy,
) -> Result<Bytes> {
    if declared_len < SUBHEADER_SIZE {
        return Err(DemuxError::TruncatedPayload {
            remaining: declared_len,
        });
    }

    let mut subheader = [0u8; SUBHEADER_SIZE];
    reader.read_exact(&mut subheader).map_err(from_read_error)?;

    let codec_id = subheader[0] & 0x0F;
    if codec_id != CODEC_ID_AVC {
        return Err(DemuxError::UnsupportedCodec(codec_id));
    }
    if subheader[1] != PACKET_KIND_NALU {
        return Err(DemuxError::UnsupportedPacketKind(subheader[1]));
    }
    // subheader[0] >> 4 is the frame type (key/inter), subheader[2..5] the
    // composition time; neither affects re-framing.

    let mut remaining = declared_len - SUBHEADER_SIZE;
    let mut out = BytesMut::with_capacity(declared_len);

    while remaining > 0 {
        if remaining < NAL_LENGTH_SIZE {
            return Err(DemuxError::TruncatedPayload { remaining });
        }
        let mut len_bytes = [0u8; NAL_LENGTH_SIZE];
        reader.read_exact(&mut len_bytes).map_err(from_read_error)?;
        remaining -= NAL_LENGTH_SIZE;

        let nal_len = u32::from_be_bytes(len_bytes) as usize;
        if nal_len > remaining {
            return Err(DemuxError::NalOverrun { nal_len, remaining });
        }
        if nal_len == 0 {
            return Err(DemuxError::EmptyNal);
        }

        let mut nal = vec![0u8; nal_len];
        reader.read_exact(&mut nal).map_err(from_read_error)?;
        remaining -= nal_len;

        out.put_slice(policy.start_code(nal[0]));
        out.put_slice(&nal);
    }

    Ok(out.freeze())
}

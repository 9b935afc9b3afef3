//! FLV envelope parsing: stream header, tag headers, trailer.
//!
//! Only the fields needed to locate payload boundaries are interpreted;
//! timestamps and stream ids are carried in the envelope but ignored.

use std::io::Read;

use tracing::debug;

use crate::error::{from_read_error, DemuxError, Result};

/// First three bytes of a valid stream.
pub const STREAM_SIGNATURE: [u8; 3] = *b"FLV";

/// Stream header: signature (3) + version (1) + flags (1) + header size (4).
pub const STREAM_HEADER_SIZE: usize = 9;

/// Tag envelope: previous tag size (4) + tag type (1) + payload length (3)
/// + timestamp (3) + timestamp extension (1) + stream id (3).
pub const TAG_HEADER_SIZE: usize = 15;

/// Trailing bytes some encoders append after their final tag.
pub const TRAILER_SIZE: usize = 4;

const SUPPORTED_VERSION: u8 = 1;
const FLAGS_VIDEO_ONLY: u8 = 0x01;

/// Read and validate the 9-byte stream header.
///
/// The signature, version, and flags are checked exactly; on any mismatch
/// the error is returned before another byte is consumed. Flags are a
/// bitmask (0x04 audio, 0x01 video) and only video-only streams are
/// accepted.
pub fn read_stream_header<R: Read + ?Sized>(reader: &mut R) -> Result<()> {
    let mut header = [0u8; STREAM_HEADER_SIZE];
    reader.read_exact(&mut header).map_err(from_read_error)?;

    if header[0..3] != STREAM_SIGNATURE {
        return Err(DemuxError::BadSignature([header[0], header[1], header[2]]));
    }
    if header[3] != SUPPORTED_VERSION {
        return Err(DemuxError::BadVersion(header[3]));
    }
    if header[4] != FLAGS_VIDEO_ONLY {
        return Err(DemuxError::BadFlags(header[4]));
    }
    // header[5..9]: total header size, used only to skip expanded headers.
    Ok(())
}

/// Read one 15-byte tag envelope and return its declared payload length.
///
/// Nothing but byte count is validated; the 3-byte big-endian length at
/// offset 5 is the only field the pipeline consumes. EOF before a full
/// envelope signals end of stream / encoder exit.
pub fn read_tag_header<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    let mut header = [0u8; TAG_HEADER_SIZE];
    reader.read_exact(&mut header).map_err(from_read_error)?;

    Ok(u32::from_be_bytes([0, header[5], header[6], header[7]]))
}

/// One-time startup sequence: validate the stream header, then read and
/// discard the first tag's entire payload.
///
/// Encoders emit one non-media tag (sequence header / metadata) at stream
/// start; its content is irrelevant to re-framing.
pub fn read_stream_header_and_first_payload<R: Read + ?Sized>(reader: &mut R) -> Result<()> {
    read_stream_header(reader)?;

    let payload_len = read_tag_header(reader)?;
    discard(reader, payload_len as usize)?;
    debug!(payload_len, "discarded start-of-stream tag");
    Ok(())
}

/// Best-effort read of the 4-byte trailer some encoders append after the
/// final tag instead of beginning a next envelope.
///
/// Returns whether a full trailer was present. Absence is not an error;
/// some encoders omit it.
pub fn read_trailer<R: Read + ?Sized>(reader: &mut R) -> bool {
    let mut trailer = [0u8; TRAILER_SIZE];
    match reader.read_exact(&mut trailer) {
        Ok(()) => true,
        Err(err) => {
            debug!(%err, "no stream trailer");
            false
        }
    }
}

fn discard<R: Read + ?Sized>(reader: &mut R, mut remaining: usize) -> Result<()> {
    let mut chunk = [0u8; 4096];
    while remaining > 0 {
        let take = remaining.min(chunk.len());
        reader
            .read_exact(&mut chunk[..take])
            .map_err(from_read_error)?;
        remaining -= take;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;

    fn header_bytes() -> Vec<u8> {
        vec![b'F', b'L', b'V', 1, 1, 0, 0, 0, 9]
    }

    fn tag_bytes(payload_len: u32) -> Vec<u8> {
        let mut tag = vec![0u8; TAG_HEADER_SIZE];
        tag[4] = 9; // video tag type
        tag[5..8].copy_from_slice(&payload_len.to_be_bytes()[1..4]);
        tag
    }

    #[test]
    fn accepts_valid_header() {
        let mut cursor = Cursor::new(header_bytes());
        read_stream_header(&mut cursor).unwrap();
        assert_eq!(cursor.position(), STREAM_HEADER_SIZE as u64);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = header_bytes();
        bytes[0] = b'X';
        let err = read_stream_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DemuxError::BadSignature(_)));
    }

    #[test]
    fn rejects_bad_version() {
        let mut bytes = header_bytes();
        bytes[3] = 2;
        let err = read_stream_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DemuxError::BadVersion(2)));
    }

    #[test]
    fn rejects_audio_video_flags() {
        let mut bytes = header_bytes();
        bytes[4] = 0x05; // audio + video
        let err = read_stream_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DemuxError::BadFlags(0x05)));
    }

    #[test]
    fn bad_header_stops_reading() {
        let mut bytes = header_bytes();
        bytes[0] = b'X';
        bytes.extend_from_slice(&[0xAA; 32]); // payload bytes that must stay untouched

        let mut counting = CountingReader::new(bytes);
        let _ = read_stream_header(&mut counting).unwrap_err();
        assert_eq!(counting.consumed, STREAM_HEADER_SIZE);
    }

    #[test]
    fn truncated_header_is_eof() {
        let err = read_stream_header(&mut Cursor::new(&b"FL"[..])).unwrap_err();
        assert!(matches!(err, DemuxError::UnexpectedEof));
    }

    #[test]
    fn tag_header_extracts_payload_length() {
        let mut cursor = Cursor::new(tag_bytes(0x01_02_03));
        let len = read_tag_header(&mut cursor).unwrap();
        assert_eq!(len, 0x01_02_03);
        assert_eq!(cursor.position(), TAG_HEADER_SIZE as u64);
    }

    #[test]
    fn tag_header_ignores_other_fields() {
        let mut tag = tag_bytes(10);
        tag[0..4].copy_from_slice(&[0xFF; 4]); // previous tag size
        tag[8..15].copy_from_slice(&[0xFF; 7]); // timestamp + stream id
        let len = read_tag_header(&mut Cursor::new(tag)).unwrap();
        assert_eq!(len, 10);
    }

    #[test]
    fn short_tag_header_is_eof() {
        let err = read_tag_header(&mut Cursor::new(vec![0u8; 7])).unwrap_err();
        assert!(matches!(err, DemuxError::UnexpectedEof));
    }

    #[test]
    fn startup_sequence_discards_first_payload() {
        let mut stream = header_bytes();
        stream.extend_from_slice(&tag_bytes(6));
        stream.extend_from_slice(&[0x17, 0, 0, 0, 0, 0]); // sequence header payload
        stream.extend_from_slice(b"next");

        let mut cursor = Cursor::new(stream);
        read_stream_header_and_first_payload(&mut cursor).unwrap();

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"next");
    }

    #[test]
    fn startup_sequence_fails_on_truncated_first_payload() {
        let mut stream = header_bytes();
        stream.extend_from_slice(&tag_bytes(100));
        stream.extend_from_slice(&[0u8; 10]);

        let err = read_stream_header_and_first_payload(&mut Cursor::new(stream)).unwrap_err();
        assert!(matches!(err, DemuxError::UnexpectedEof));
    }

    #[test]
    fn trailer_present() {
        let mut cursor = Cursor::new(vec![0u8; TRAILER_SIZE]);
        assert!(read_trailer(&mut cursor));
    }

    #[test]
    fn trailer_absent() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(!read_trailer(&mut cursor));
    }

    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        consumed: usize,
    }

    impl CountingReader {
        fn new(bytes: Vec<u8>) -> Self {
            Self {
                inner: Cursor::new(bytes),
                consumed: 0,
            }
        }
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.consumed += n;
            Ok(n)
        }
    }
}

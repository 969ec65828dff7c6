//! Frame codec.
//!
//! One record is persisted as one frame:
//!
//! ```text
//! | marker (4) | length (4) | crc32 (4) | payload (L) | zero padding |
//! ```
//!
//! All integers are little-endian. The CRC32 (IEEE) covers the marker, the
//! length and the payload. Padding brings the frame to a multiple of the
//! alignment unit, so the next frame always starts at
//! `offset + frame_len(L)` and a torn write can only damage the last frame.
//! Padding bytes are not covered by the checksum.

use crate::config::LogConfig;
use crate::error::{LogError, LogResult};
use crc32fast::Hasher;
use thiserror::Error;

/// Format marker stored in the first four bytes of every frame.
///
/// The last byte is the format version.
pub const FRAME_MARKER: u32 = u32::from_le_bytes(*b"RIO\x01");

/// Size of the fixed frame header.
pub const HEADER_SIZE: usize = 12;

/// Default alignment unit.
pub const DEFAULT_ALIGNMENT: usize = 512;

/// Largest payload the 32-bit length field can describe.
pub const MAX_RECORD_SIZE: usize = u32::MAX as usize;

/// Bytes covered by the checksum before the payload.
const CHECKSUMMED_HEADER: usize = 8;

/// The fixed-size header at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Format marker, [`FRAME_MARKER`] for frames written by this crate.
    pub marker: u32,
    /// Payload length in bytes.
    pub payload_len: u32,
    /// Stored checksum.
    pub checksum: u32,
}

impl FrameHeader {
    /// Parses a header from the first [`HEADER_SIZE`] bytes of `bytes`.
    ///
    /// Returns `None` if fewer bytes are available.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header = bytes.get(..HEADER_SIZE)?;
        let word = |at: usize| {
            u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
        };
        Some(Self {
            marker: word(0),
            payload_len: word(4),
            checksum: word(8),
        })
    }
}

/// Why a complete frame failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CorruptionKind {
    /// The marker is not [`FRAME_MARKER`].
    #[error("bad frame marker {found:#010x}")]
    BadMarker {
        /// The marker that was read.
        found: u32,
    },

    /// The declared payload length exceeds the configured limit.
    #[error("declared length {len} exceeds limit {max}")]
    LengthOverLimit {
        /// Declared payload length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The stored checksum does not match the recomputed one.
    #[error("checksum mismatch: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Checksum stored in the header.
        stored: u32,
        /// Checksum recomputed over header fields and payload.
        computed: u32,
    },
}

/// Outcome of decoding the bytes at one frame offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// A well-formed frame.
    Frame {
        /// The record payload, borrowed from the input buffer.
        payload: &'a [u8],
        /// Total frame length including padding.
        consumed: usize,
    },

    /// Fewer bytes are available than the frame needs.
    Incomplete {
        /// Bytes needed for the header, or for the whole aligned frame.
        needed: usize,
        /// Bytes that were available.
        available: usize,
    },

    /// The frame is complete but does not validate.
    Corrupt(CorruptionKind),
}

/// Encodes and decodes frames for one alignment unit and record limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    alignment: usize,
    max_record_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            max_record_size: MAX_RECORD_SIZE,
        }
    }
}

impl FrameCodec {
    /// Creates a codec from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: &LogConfig) -> LogResult<Self> {
        config.validate()?;
        Ok(Self {
            alignment: config.alignment,
            max_record_size: config.max_record_size,
        })
    }

    /// Returns the alignment unit.
    #[must_use]
    pub const fn alignment(&self) -> usize {
        self.alignment
    }

    /// Returns the largest accepted payload length.
    #[must_use]
    pub const fn max_record_size(&self) -> usize {
        self.max_record_size
    }

    /// Returns the encoded length of a frame carrying `payload_len` bytes.
    ///
    /// Returns `None` if the length does not fit in `usize`.
    #[must_use]
    pub fn frame_len(&self, payload_len: usize) -> Option<usize> {
        let unpadded = HEADER_SIZE.checked_add(payload_len)?;
        let mask = self.alignment - 1;
        unpadded.checked_add(mask).map(|n| n & !mask)
    }

    /// Encodes one payload into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::OversizedRecord`] if the payload is longer than
    /// the configured maximum.
    pub fn encode(&self, payload: &[u8]) -> LogResult<Vec<u8>> {
        self.encode_chunks(&[payload])
    }

    /// Encodes one payload given as consecutive chunks into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::OversizedRecord`] if the combined length is
    /// longer than the configured maximum.
    pub fn encode_chunks(&self, chunks: &[&[u8]]) -> LogResult<Vec<u8>> {
        let len = self.checked_payload_len(chunks)?;
        let frame_len = self
            .frame_len(len)
            .ok_or_else(|| LogError::oversized(len, self.max_record_size))?;
        let mut out = Vec::with_capacity(frame_len);
        self.encode_into(&mut out, chunks, len);
        Ok(out)
    }

    /// Sums chunk lengths and checks them against the record limit.
    pub(crate) fn checked_payload_len(&self, chunks: &[&[u8]]) -> LogResult<usize> {
        let len = chunks
            .iter()
            .try_fold(0usize, |acc, chunk| acc.checked_add(chunk.len()))
            .unwrap_or(usize::MAX);
        if len > self.max_record_size {
            return Err(LogError::oversized(len, self.max_record_size));
        }
        Ok(len)
    }

    /// Appends a frame to `out`. `len` must be the checked payload length.
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>, chunks: &[&[u8]], len: usize) {
        let start = out.len();
        let len_field = (len as u32).to_le_bytes();

        let mut hasher = Hasher::new();
        hasher.update(&FRAME_MARKER.to_le_bytes());
        hasher.update(&len_field);
        for chunk in chunks {
            hasher.update(chunk);
        }

        out.extend_from_slice(&FRAME_MARKER.to_le_bytes());
        out.extend_from_slice(&len_field);
        out.extend_from_slice(&hasher.finalize().to_le_bytes());
        for chunk in chunks {
            out.extend_from_slice(chunk);
        }

        let written = out.len() - start;
        let mask = self.alignment - 1;
        let padded = (written + mask) & !mask;
        out.resize(start + padded, 0);
    }

    /// Decodes the frame at the start of `buffer`.
    ///
    /// `buffer` holds the bytes from the frame offset to (at most) the end
    /// of storage. Extra bytes after the frame are ignored.
    #[must_use]
    pub fn decode<'a>(&self, buffer: &'a [u8]) -> Decoded<'a> {
        let Some(header) = FrameHeader::parse(buffer) else {
            return Decoded::Incomplete {
                needed: HEADER_SIZE,
                available: buffer.len(),
            };
        };

        if header.marker != FRAME_MARKER {
            return Decoded::Corrupt(CorruptionKind::BadMarker {
                found: header.marker,
            });
        }

        let len = header.payload_len as usize;
        if len > self.max_record_size {
            return Decoded::Corrupt(CorruptionKind::LengthOverLimit {
                len,
                max: self.max_record_size,
            });
        }

        let Some(consumed) = self.frame_len(len) else {
            return Decoded::Corrupt(CorruptionKind::LengthOverLimit {
                len,
                max: self.max_record_size,
            });
        };
        if buffer.len() < consumed {
            return Decoded::Incomplete {
                needed: consumed,
                available: buffer.len(),
            };
        }

        let payload = &buffer[HEADER_SIZE..HEADER_SIZE + len];
        let computed = checksum(&buffer[..CHECKSUMMED_HEADER], payload);
        if computed != header.checksum {
            return Decoded::Corrupt(CorruptionKind::ChecksumMismatch {
                stored: header.checksum,
                computed,
            });
        }

        Decoded::Frame { payload, consumed }
    }
}

fn checksum(header: &[u8], payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(header);
    hasher.update(payload);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(alignment: usize) -> FrameCodec {
        FrameCodec::new(&LogConfig::new().alignment(alignment)).unwrap()
    }

    #[test]
    fn marker_layout() {
        assert_eq!(&FRAME_MARKER.to_le_bytes(), b"RIO\x01");
    }

    #[test]
    fn encode_pads_to_alignment() {
        let codec = FrameCodec::default();
        let frame = codec.encode(b"hello").unwrap();

        assert_eq!(frame.len(), 512);
        assert_eq!(&frame[0..4], b"RIO\x01");
        assert_eq!(u32::from_le_bytes(frame[4..8].try_into().unwrap()), 5);
        assert_eq!(&frame[12..17], b"hello");
        assert!(frame[17..].iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_payload_is_one_unit() {
        let codec = FrameCodec::default();
        let frame = codec.encode(b"").unwrap();
        assert_eq!(frame.len(), 512);
        assert_eq!(
            codec.decode(&frame),
            Decoded::Frame {
                payload: b"",
                consumed: 512
            }
        );
    }

    #[test]
    fn frame_len_boundaries() {
        let codec = FrameCodec::default();
        assert_eq!(codec.frame_len(0), Some(512));
        assert_eq!(codec.frame_len(500), Some(512));
        assert_eq!(codec.frame_len(501), Some(1024));
        assert_eq!(codec.frame_len(usize::MAX), None);

        let unaligned = self::codec(1);
        assert_eq!(unaligned.frame_len(7), Some(19));
    }

    #[test]
    fn checksum_covers_marker_length_and_payload() {
        let codec = FrameCodec::default();
        let frame = codec.encode(b"payload").unwrap();

        let mut expected = Hasher::new();
        expected.update(&frame[0..8]);
        expected.update(b"payload");
        assert_eq!(
            u32::from_le_bytes(frame[8..12].try_into().unwrap()),
            expected.finalize()
        );
    }

    #[test]
    fn chunks_encode_like_concatenation() {
        let codec = FrameCodec::default();
        let chunked = codec
            .encode_chunks(&[b"hello ".as_slice(), b"world".as_slice()])
            .unwrap();
        let whole = codec.encode(b"hello world").unwrap();
        assert_eq!(chunked, whole);
    }

    #[test]
    fn payload_may_contain_header_bytes() {
        let codec = codec(16);
        let tricky = codec.encode(b"RIO\x01").unwrap();
        let mut payload = tricky.clone();
        payload.extend_from_slice(&tricky);

        let frame = codec.encode(&payload).unwrap();
        match codec.decode(&frame) {
            Decoded::Frame { payload: got, .. } => assert_eq!(got, payload.as_slice()),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn oversized_rejected() {
        let codec = FrameCodec::new(&LogConfig::new().max_record_size(8)).unwrap();
        assert!(codec.encode(&[0u8; 8]).is_ok());

        let err = codec.encode(&[0u8; 9]).unwrap_err();
        assert!(matches!(err, LogError::OversizedRecord { len: 9, max: 8 }));

        let err = codec
            .encode_chunks(&[[1u8; 5].as_slice(), [2u8; 4].as_slice()])
            .unwrap_err();
        assert!(matches!(err, LogError::OversizedRecord { len: 9, max: 8 }));
    }

    #[test]
    fn short_header_is_incomplete() {
        let codec = FrameCodec::default();
        let frame = codec.encode(b"abc").unwrap();
        assert_eq!(
            codec.decode(&frame[..7]),
            Decoded::Incomplete {
                needed: HEADER_SIZE,
                available: 7
            }
        );
        assert_eq!(
            codec.decode(&[]),
            Decoded::Incomplete {
                needed: HEADER_SIZE,
                available: 0
            }
        );
    }

    #[test]
    fn missing_padding_is_incomplete() {
        let codec = FrameCodec::default();
        let frame = codec.encode(b"abc").unwrap();
        assert_eq!(
            codec.decode(&frame[..15]),
            Decoded::Incomplete {
                needed: 512,
                available: 15
            }
        );
    }

    #[test]
    fn flipped_checksum_bit_is_corrupt() {
        let codec = FrameCodec::default();
        let mut frame = codec.encode(b"abc").unwrap();
        frame[9] ^= 0x10;
        assert!(matches!(
            codec.decode(&frame),
            Decoded::Corrupt(CorruptionKind::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn flipped_payload_bit_is_corrupt() {
        let codec = FrameCodec::default();
        let mut frame = codec.encode(b"abc").unwrap();
        frame[13] ^= 0x01;
        assert!(matches!(
            codec.decode(&frame),
            Decoded::Corrupt(CorruptionKind::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn zeroed_region_is_bad_marker() {
        let codec = FrameCodec::default();
        assert_eq!(
            codec.decode(&[0u8; 512]),
            Decoded::Corrupt(CorruptionKind::BadMarker { found: 0 })
        );
    }

    #[test]
    fn declared_length_over_limit_is_corrupt() {
        let writer = FrameCodec::default();
        let reader = FrameCodec::new(&LogConfig::new().max_record_size(4)).unwrap();
        let frame = writer.encode(b"too long").unwrap();
        assert_eq!(
            reader.decode(&frame),
            Decoded::Corrupt(CorruptionKind::LengthOverLimit { len: 8, max: 4 })
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let codec = FrameCodec::default();
        let mut buf = codec.encode(b"first").unwrap();
        buf.extend_from_slice(&codec.encode(b"second").unwrap());

        assert_eq!(
            codec.decode(&buf),
            Decoded::Frame {
                payload: b"first",
                consumed: 512
            }
        );
        assert_eq!(
            codec.decode(&buf[512..]),
            Decoded::Frame {
                payload: b"second",
                consumed: 512
            }
        );
    }
}

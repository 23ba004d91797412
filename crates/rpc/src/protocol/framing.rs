//! Message framing for the wire protocol.
//!
//! Every frame is `length (u32 BE) | type (u8) | crc32 (u32 BE) | payload`.
//! The decoder never yields a frame until all of its payload has arrived.

use crate::error::{Error, ProtocolError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Maximum frame size (10MB by default).
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Frame header size (4 bytes length + 1 byte type + 4 bytes checksum).
pub const FRAME_HEADER_SIZE: usize = 9;

/// Type of frame being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Request frame.
    Request = 0x01,
    /// Response frame.
    Response = 0x02,
    /// Close frame.
    Close = 0x03,
}

impl TryFrom<u8> for FrameType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> std::result::Result<Self, ProtocolError> {
        match value {
            0x01 => Ok(Self::Request),
            0x02 => Ok(Self::Response),
            0x03 => Ok(Self::Close),
            _ => Err(ProtocolError::InvalidFrame(format!(
                "Unknown frame type: {value:#x}"
            ))),
        }
    }
}

/// A frame in the wire protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Type of this frame.
    pub frame_type: FrameType,
    /// Frame payload.
    pub payload: Bytes,
    /// Optional checksum for integrity.
    pub checksum: Option<u32>,
}

impl Frame {
    /// Create a new frame.
    pub fn new(frame_type: FrameType, payload: Bytes) -> Self {
        // Zero on the wire means "no checksum".
        let checksum = match crc32fast::hash(&payload) {
            0 => None,
            crc => Some(crc),
        };
        Self {
            frame_type,
            payload,
            checksum,
        }
    }

    /// Create a frame without checksum.
    pub const fn new_unchecked(frame_type: FrameType, payload: Bytes) -> Self {
        Self {
            frame_type,
            payload,
            checksum: None,
        }
    }

    /// An empty close frame.
    #[must_use]
    pub const fn close() -> Self {
        Self::new_unchecked(FrameType::Close, Bytes::new())
    }

    /// Verify the checksum if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the checksum is invalid.
    pub fn verify_checksum(&self) -> Result<()> {
        if let Some(expected) = self.checksum {
            let actual = crc32fast::hash(&self.payload);
            if expected != actual {
                return Err(ProtocolError::ChecksumMismatch { expected, actual }.into());
            }
        }
        Ok(())
    }
}

/// Codec for encoding/decoding frames.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
    verify_checksum: bool,
}

impl FrameCodec {
    /// Create a new frame codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            verify_checksum: true,
        }
    }

    /// Create a codec with custom max frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Disable checksum verification (for testing).
    #[must_use]
    pub const fn without_checksum_verification(mut self) -> Self {
        self.verify_checksum = false;
        self
    }

    /// Largest payload this codec accepts.
    #[must_use]
    pub const fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>> {
        // Need at least header size
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        // Parse header without consuming
        let mut header = &buf[..FRAME_HEADER_SIZE];
        let payload_len = header.get_u32() as usize;
        let frame_type_byte = header.get_u8();
        let checksum = header.get_u32();

        if payload_len > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len,
                max: self.max_frame_size,
            }
            .into());
        }

        let frame_type = FrameType::try_from(frame_type_byte)?;

        // Check if we have the full frame
        let frame_len = FRAME_HEADER_SIZE + payload_len;
        if buf.len() < frame_len {
            buf.reserve(frame_len - buf.len());
            return Ok(None);
        }

        // Consume header and payload
        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(payload_len).freeze();

        let frame = Frame {
            frame_type,
            payload,
            checksum: if checksum != 0 { Some(checksum) } else { None },
        };

        if self.verify_checksum {
            frame.verify_checksum()?;
        }

        Ok(Some(frame))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            // The peer went away in the middle of a frame.
            None if !buf.is_empty() => Err(Error::ChannelClosed),
            None => Ok(None),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, buf: &mut BytesMut) -> Result<()> {
        let payload_len = frame.payload.len();

        if payload_len > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len,
                max: self.max_frame_size,
            }
            .into());
        }

        buf.reserve(FRAME_HEADER_SIZE + payload_len);

        #[allow(clippy::cast_possible_truncation)]
        buf.put_u32(payload_len as u32);
        buf.put_u8(frame.frame_type as u8);
        buf.put_u32(frame.checksum.unwrap_or(0));

        buf.put(frame.payload);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_frame_roundtrip() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        let frame = Frame::new(FrameType::Request, Bytes::from("Hello, World!"));

        codec.encode(frame.clone(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();

        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        // Write partial header
        buf.put_u32(100); // length
        buf.put_u8(FrameType::Request as u8);

        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_checksum_verification() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        let payload = b"Hello, World!";
        #[allow(clippy::cast_possible_truncation)]
        buf.put_u32(payload.len() as u32);
        buf.put_u8(FrameType::Request as u8);
        buf.put_u32(12345); // Wrong checksum
        buf.put_slice(payload);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(Error::Protocol(ProtocolError::ChecksumMismatch { .. }))
        ));
    }

    #[test]
    fn test_oversized_frame_rejected_before_buffering() {
        let mut codec = FrameCodec::new().with_max_frame_size(16);
        let mut buf = BytesMut::new();
        buf.put_u32(17);
        buf.put_u8(FrameType::Request as u8);
        buf.put_u32(0);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(Error::Protocol(ProtocolError::FrameTooLarge { size: 17, max: 16 }))
        ));

        let frame = Frame::new(FrameType::Response, Bytes::from(vec![0u8; 17]));
        assert!(codec.encode(frame, &mut BytesMut::new()).is_err());
    }

    #[test]
    fn test_unknown_frame_type() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u32(0);
        buf.put_u8(0x7f);
        buf.put_u32(0);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_truncated_frame_at_eof_is_channel_closed() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Frame::new(FrameType::Request, Bytes::from("abcdef")), &mut buf)
            .unwrap();
        buf.truncate(buf.len() - 2);

        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(Error::ChannelClosed)
        ));
    }

    proptest! {
        /// Feeding the byte stream in arbitrary chunks never shifts a frame boundary.
        #[test]
        fn prop_chunked_reads_preserve_boundaries(
            payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..8),
            chunk in 1usize..32,
        ) {
            let mut codec = FrameCodec::new();
            let mut wire = BytesMut::new();
            let frames: Vec<Frame> = payloads
                .into_iter()
                .map(|p| Frame::new(FrameType::Request, Bytes::from(p)))
                .collect();
            for frame in &frames {
                codec.encode(frame.clone(), &mut wire).unwrap();
            }

            let mut buf = BytesMut::new();
            let mut decoded = Vec::new();
            for piece in wire.chunks(chunk) {
                buf.extend_from_slice(piece);
                while let Some(frame) = codec.decode(&mut buf).unwrap() {
                    decoded.push(frame);
                }
            }

            prop_assert!(buf.is_empty());
            prop_assert_eq!(decoded, frames);
        }
    }
}

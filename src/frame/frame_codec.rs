use crate::{constants::FRAME_LENGTH_FIELD_SIZE, frame::FrameEncodeError};

/// Wraps opaque payloads with a fixed-width length prefix.
///
/// A frame is a 4-byte little-endian `u32` payload length followed by the
/// payload itself. The codec never looks inside the payload; splitting a byte
/// stream back into frames is the job of [`FrameStreamDecoder`](super::FrameStreamDecoder).
pub struct FrameCodec;

impl FrameCodec {
    /// Encodes `payload` into a single frame.
    ///
    /// # Arguments
    ///
    /// * `payload` - The bytes to wrap.
    /// * `max_frame_size` - The largest payload the peer is willing to accept.
    ///
    /// # Returns
    ///
    /// The length prefix followed by the payload, or
    /// `FrameEncodeError::FrameTooLarge` if the payload exceeds `max_frame_size`.
    pub fn encode(payload: &[u8], max_frame_size: usize) -> Result<Vec<u8>, FrameEncodeError> {
        if payload.len() > max_frame_size || payload.len() > u32::MAX as usize {
            return Err(FrameEncodeError::FrameTooLarge {
                len: payload.len(),
                max: max_frame_size,
            });
        }

        let mut buf = Vec::with_capacity(FRAME_LENGTH_FIELD_SIZE + payload.len());
        buf.extend(&(payload.len() as u32).to_le_bytes());
        buf.extend(payload);

        Ok(buf)
    }

    /// Reads the declared payload length from the start of `buf`, if a full
    /// length field is present.
    pub fn peek_len(buf: &[u8]) -> Option<usize> {
        buf.get(..FRAME_LENGTH_FIELD_SIZE)
            .and_then(|bytes| bytes.try_into().ok())
            .map(u32::from_le_bytes)
            .map(|n| n as usize)
    }
}

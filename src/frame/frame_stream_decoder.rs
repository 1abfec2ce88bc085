use crate::constants::FRAME_LENGTH_FIELD_SIZE;
use crate::frame::{FrameCodec, FrameDecodeError};
use std::collections::VecDeque;

/// A buffering decoder that splits a byte stream into length-prefixed frames.
///
/// Bytes may arrive in arbitrary chunks: a frame split across several reads
/// is held until complete, and several frames packed into one read are all
/// emitted, in order.
///
/// ### Behavior Summary:
/// - A length prefix above `max_frame_size` yields `FrameTooLarge` as soon as
///   the prefix is visible, before the payload arrives. The decoder is then
///   poisoned: the stream position can no longer be trusted, so every later
///   call yields the same error.
/// - `has_partial_frame` reports whether bytes of an unfinished frame are
///   buffered, which lets the transport tell a clean close at a frame
///   boundary from a close mid-frame.
pub struct FrameStreamDecoder {
    buffer: Vec<u8>, // Holds partial frame data
    max_frame_size: usize,
    poisoned: Option<FrameDecodeError>,
}

pub struct FrameDecoderIterator {
    queue: VecDeque<Result<Vec<u8>, FrameDecodeError>>,
}

impl Iterator for FrameDecoderIterator {
    type Item = Result<Vec<u8>, FrameDecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front()
    }
}

impl FrameStreamDecoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_size,
            poisoned: None,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn has_partial_frame(&self) -> bool {
        !self.buffer.is_empty()
    }

    // Reads new bytes and attempts to decode them into frame payloads
    pub fn read_bytes(&mut self, data: &[u8]) -> FrameDecoderIterator {
        let mut queue = VecDeque::new();

        if let Some(err) = &self.poisoned {
            queue.push_back(Err(err.clone()));
            return FrameDecoderIterator { queue };
        }

        self.buffer.extend_from_slice(data);

        while let Some(len) = FrameCodec::peek_len(&self.buffer) {
            if len > self.max_frame_size {
                let err = FrameDecodeError::FrameTooLarge {
                    declared: len,
                    max: self.max_frame_size,
                };
                tracing::debug!(declared = len, max = self.max_frame_size, "oversized length prefix");
                self.buffer.clear();
                self.poisoned = Some(err.clone());
                queue.push_back(Err(err));
                break;
            }

            let total = FRAME_LENGTH_FIELD_SIZE + len;

            if self.buffer.len() < total {
                break;
            }

            let payload = self.buffer[FRAME_LENGTH_FIELD_SIZE..total].to_vec();
            self.buffer.drain(..total);
            queue.push_back(Ok(payload));
        }

        FrameDecoderIterator { queue }
    }
}

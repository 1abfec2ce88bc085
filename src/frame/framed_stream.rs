use crate::constants::DEFAULT_READ_CHUNK_SIZE;
use crate::frame::{FrameCodec, FrameDecodeError, FrameEncodeError, FrameStreamDecoder};
use std::collections::VecDeque;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Failures raised while moving frames over a live connection.
#[derive(Debug, Error)]
pub enum FrameIoError {
    /// The peer closed the connection with a frame only partially received.
    #[error("connection closed mid-frame")]
    ConnectionClosed,

    #[error("frame too large: declared {declared} bytes exceeds the {max} byte limit")]
    FrameTooLarge { declared: usize, max: usize },

    #[error(transparent)]
    Encode(#[from] FrameEncodeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<FrameDecodeError> for FrameIoError {
    fn from(err: FrameDecodeError) -> Self {
        match err {
            FrameDecodeError::FrameTooLarge { declared, max } => {
                FrameIoError::FrameTooLarge { declared, max }
            }
        }
    }
}

/// A byte stream (typically a `TcpStream`) paired with a frame decoder.
///
/// `write_frame` and `read_frame` take `&mut self`, so at most one writer and
/// one reader can touch the connection at a time. Frames that arrive packed
/// behind the one being read are queued and handed out by later reads.
pub struct FramedStream<S> {
    stream: S,
    decoder: FrameStreamDecoder,
    pending: VecDeque<Vec<u8>>,
    read_buf: Vec<u8>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, max_frame_size: usize) -> Self {
        Self {
            stream,
            decoder: FrameStreamDecoder::new(max_frame_size),
            pending: VecDeque::new(),
            read_buf: vec![0u8; DEFAULT_READ_CHUNK_SIZE],
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Writes a length prefix followed by `payload`, then flushes.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), FrameIoError> {
        let bytes = FrameCodec::encode(payload, self.decoder.max_frame_size())?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Waits for the next complete frame.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly between
    /// frames.
    pub async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameIoError> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                if self.decoder.has_partial_frame() {
                    return Err(FrameIoError::ConnectionClosed);
                }
                return Ok(None);
            }

            for result in self.decoder.read_bytes(&self.read_buf[..n]) {
                self.pending.push_back(result?);
            }
        }
    }

    /// Shuts down the write half so the peer observes a clean close.
    pub async fn shutdown(&mut self) -> Result<(), FrameIoError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

mod frame_codec;
mod frame_error;
mod frame_stream_decoder;
#[cfg(feature = "tokio_support")]
mod framed_stream;

pub use frame_codec::FrameCodec;
pub use frame_error::{FrameDecodeError, FrameEncodeError};
pub use frame_stream_decoder::{FrameDecoderIterator, FrameStreamDecoder};
#[cfg(feature = "tokio_support")]
pub use framed_stream::{FrameIoError, FramedStream};

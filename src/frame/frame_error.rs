use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameEncodeError {
    /// The payload is larger than the configured frame limit.
    #[error("frame too large: {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameDecodeError {
    /// A length prefix declared more bytes than the configured limit.
    #[error("frame too large: declared {declared} bytes exceeds the {max} byte limit")]
    FrameTooLarge { declared: usize, max: usize },
}

use thiserror::Error;

/// Reasons a byte sequence failed to decode as the expected value layout.
///
/// Every variant is a flavor of "malformed payload": the bytes do not match
/// what the operation descriptor says should be there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireDecodeError {
    #[error("malformed payload: truncated data (needed {needed} more bytes at offset {offset})")]
    Truncated { offset: usize, needed: usize },

    #[error("malformed payload: invalid value tag {tag:#04x} at offset {offset}")]
    InvalidTag { offset: usize, tag: u8 },

    #[error("malformed payload: invalid boolean byte {byte:#04x} at offset {offset}")]
    InvalidBool { offset: usize, byte: u8 },

    #[error("malformed payload: string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("malformed payload: expected {expected} values, found {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("malformed payload: value {index} is {found}, expected {expected}")]
    TypeMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("malformed payload: {remaining} trailing bytes after the last value")]
    TrailingBytes { remaining: usize },

    #[error("malformed payload: nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },
}

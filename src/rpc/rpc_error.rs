use crate::codec::WireDecodeError;
use thiserror::Error;

/// Raised when an interface cannot be exposed through a single-operation
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("operation name must not be empty")]
    EmptyOperationName,

    #[error("type `{ty}` of `{operation}` nests {depth} levels, at most {max} are supported")]
    NestingTooDeep {
        operation: String,
        ty: String,
        depth: usize,
        max: usize,
    },

    #[error("interface `{interface}` declares no operations; exactly one is required")]
    NoOperations { interface: String },

    #[error(
        "interface `{interface}` declares {} operations ({}); exactly one is required",
        .operations.len(),
        .operations.join(", ")
    )]
    MultipleOperations {
        interface: String,
        operations: Vec<String>,
    },
}

/// Raised when a call or response message cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcMessageError {
    #[error("message of {len} bytes is shorter than its {needed} byte header")]
    TooShort { len: usize, needed: usize },

    #[error("unexpected message type byte {found:#04x}")]
    UnexpectedMessageType { found: u8 },

    #[error("invalid result status byte {0:#04x}")]
    InvalidStatus(u8),

    #[error(transparent)]
    Payload(#[from] WireDecodeError),
}

use thiserror::Error;

/// Well-known failure kinds produced by the framework itself.
///
/// Implementations are free to use any other kind string.
pub mod failure_kind {
    /// An implementation returned an error that carried no kind of its own.
    pub const APPLICATION_ERROR: &str = "ApplicationError";
    /// An implementation panicked.
    pub const PANIC: &str = "Panic";
    /// The request arguments did not match the descriptor's parameter layout.
    pub const MALFORMED_PAYLOAD: &str = "MalformedPayload";
    /// The request named an operation fingerprint the host does not serve.
    pub const OPERATION_MISMATCH: &str = "OperationMismatch";
    /// The implementation returned a value that does not match the
    /// descriptor's return type.
    pub const INVALID_RETURN_VALUE: &str = "InvalidReturnValue";
    /// The request frame exceeded the host's frame limit.
    pub const FRAME_TOO_LARGE: &str = "FrameTooLarge";
    /// The request header could not be parsed.
    pub const INVALID_REQUEST: &str = "InvalidRequest";
}

/// A failure descriptor that crosses the wire: a kind plus a message.
///
/// Returning an `RpcFailure` (boxed or not) from an implementation preserves
/// its `kind` on the client side. Location and backtrace information does
/// not survive the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RpcFailure {
    pub kind: String,
    pub message: String,
}

impl RpcFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Builds a failure of kind [`failure_kind::APPLICATION_ERROR`].
    pub fn application(message: impl Into<String>) -> Self {
        Self::new(failure_kind::APPLICATION_ERROR, message)
    }
}

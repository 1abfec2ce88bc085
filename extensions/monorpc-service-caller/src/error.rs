use monorpc::rpc::{DescriptorError, RpcFailure, RpcMessageError};
use monorpc_service::WireConvertError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while moving a call across the network.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out connecting to {addr} after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("no response within {0:?}")]
    RequestTimeout(Duration),

    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    #[error("frame of {declared} bytes exceeds the {max} byte limit")]
    FrameTooLarge { declared: usize, max: usize },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Represents errors that can occur during a call from the perspective of the
/// caller.
#[derive(Debug, Error)]
pub enum RpcCallerError {
    /// The interface could not be turned into a callable stub.
    #[error("configuration error: {0}")]
    Configuration(#[from] DescriptorError),

    /// The stub's own settings are unusable (empty host, zero frame limit).
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// A typed call was made through a stub bound to a different operation.
    #[error("stub is bound to `{bound}`, cannot call `{requested}`")]
    OperationMismatch { bound: String, requested: String },

    /// The arguments do not match the operation's parameter types. Nothing
    /// was sent.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] RpcMessageError),

    /// The decoded result did not convert into the operation's output type.
    #[error("result conversion failed: {0}")]
    Conversion(#[from] WireConvertError),

    /// The host rejected the call before or after running the implementation
    /// (unknown operation, malformed payload, invalid return value, ...).
    #[error("remote system error: {0}")]
    RemoteSystemError(RpcFailure),

    /// The implementation ran and failed.
    #[error("remote application error: {0}")]
    Application(RpcFailure),
}

impl RpcCallerError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RpcCallerError::Configuration(_) | RpcCallerError::InvalidConfig(_)
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RpcCallerError::Transport(_))
    }

    pub fn is_application(&self) -> bool {
        matches!(self, RpcCallerError::Application(_))
    }

    /// The remote failure descriptor, for application and system errors.
    pub fn failure(&self) -> Option<&RpcFailure> {
        match self {
            RpcCallerError::Application(failure) | RpcCallerError::RemoteSystemError(failure) => {
                Some(failure)
            }
            _ => None,
        }
    }
}

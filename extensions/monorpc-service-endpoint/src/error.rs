use monorpc::rpc::{CallResponse, RpcMessageError, failure_kind};
use thiserror::Error;

/// Why an incoming request could not be turned into a dispatchable call.
///
/// All variants are protocol faults: the host answers with the matching
/// [`CallResponse::SystemError`] and closes the connection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcServiceEndpointError {
    #[error("invalid request header: {0}")]
    InvalidRequest(RpcMessageError),

    #[error("no operation with fingerprint {fingerprint:#018x} is registered")]
    UnknownOperation { fingerprint: u64 },

    #[error("malformed arguments for `{operation}`: {source}")]
    MalformedPayload {
        operation: String,
        #[source]
        source: RpcMessageError,
    },
}

impl RpcServiceEndpointError {
    pub fn failure_kind(&self) -> &'static str {
        match self {
            RpcServiceEndpointError::InvalidRequest(_) => failure_kind::INVALID_REQUEST,
            RpcServiceEndpointError::UnknownOperation { .. } => failure_kind::OPERATION_MISMATCH,
            RpcServiceEndpointError::MalformedPayload { .. } => failure_kind::MALFORMED_PAYLOAD,
        }
    }

    pub fn to_response(&self) -> CallResponse {
        CallResponse::system_error(self.failure_kind(), self.to_string())
    }
}

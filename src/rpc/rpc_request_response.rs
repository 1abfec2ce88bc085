use crate::codec::{WireCodec, WireDecodeError, WireType, WireValue};
use crate::constants::{
    RPC_CALL_FINGERPRINT_OFFSET, RPC_CALL_HEADER_SIZE, RPC_MSG_TYPE_OFFSET,
    RPC_RESPONSE_HEADER_SIZE, RPC_RESPONSE_STATUS_OFFSET,
};
use crate::rpc::{OperationDescriptor, RpcFailure, RpcMessageError, RpcMessageType, RpcResultStatus};
use bytes::{BufMut, BytesMut};

/// The arguments of one invocation, addressed to an operation by fingerprint.
///
/// Wire layout: `[msg type: u8 = Call][fingerprint: u64 LE][argument sequence]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub fingerprint: u64,
    pub args: Vec<WireValue>,
}

impl CallRequest {
    pub fn new(descriptor: &OperationDescriptor, args: Vec<WireValue>) -> Self {
        Self {
            fingerprint: descriptor.fingerprint(),
            args,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(RPC_CALL_HEADER_SIZE);
        buf.put_u8(RpcMessageType::Call.into());
        buf.put_u64_le(self.fingerprint);
        WireCodec::encode_into(&mut buf, &self.args);
        buf.to_vec()
    }

    /// Reads only the header, so the receiver can look up the parameter types
    /// before decoding the arguments.
    pub fn peek_fingerprint(bytes: &[u8]) -> Result<u64, RpcMessageError> {
        check_header(bytes, RpcMessageType::Call, RPC_CALL_HEADER_SIZE)?;

        let fingerprint = bytes[RPC_CALL_FINGERPRINT_OFFSET..RPC_CALL_HEADER_SIZE]
            .try_into()
            .map(u64::from_le_bytes)
            .map_err(|_| RpcMessageError::TooShort {
                len: bytes.len(),
                needed: RPC_CALL_HEADER_SIZE,
            })?;

        Ok(fingerprint)
    }

    pub fn decode(bytes: &[u8], params: &[WireType]) -> Result<Self, RpcMessageError> {
        let fingerprint = Self::peek_fingerprint(bytes)?;
        let args = WireCodec::decode(&bytes[RPC_CALL_HEADER_SIZE..], params)?;

        Ok(Self { fingerprint, args })
    }
}

/// The outcome of one invocation.
///
/// Wire layout: `[msg type: u8 = Response][status: u8][result sequence]`,
/// where the sequence holds the single return value on success, or
/// `[kind: str, message: str]` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResponse {
    Success(WireValue),
    Fail(RpcFailure),
    SystemError(RpcFailure),
}

impl CallResponse {
    pub fn status(&self) -> RpcResultStatus {
        match self {
            CallResponse::Success(_) => RpcResultStatus::Success,
            CallResponse::Fail(_) => RpcResultStatus::Fail,
            CallResponse::SystemError(_) => RpcResultStatus::SystemError,
        }
    }

    pub fn system_error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CallResponse::SystemError(RpcFailure::new(kind, message))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(RPC_RESPONSE_HEADER_SIZE);
        buf.put_u8(RpcMessageType::Response.into());
        buf.put_u8(self.status().into());

        match self {
            CallResponse::Success(value) => {
                WireCodec::encode_into(&mut buf, std::slice::from_ref(value));
            }
            CallResponse::Fail(failure) | CallResponse::SystemError(failure) => {
                WireCodec::encode_into(
                    &mut buf,
                    &[
                        WireValue::Str(failure.kind.clone()),
                        WireValue::Str(failure.message.clone()),
                    ],
                );
            }
        }

        buf.to_vec()
    }

    pub fn decode(bytes: &[u8], returns: &WireType) -> Result<Self, RpcMessageError> {
        check_header(bytes, RpcMessageType::Response, RPC_RESPONSE_HEADER_SIZE)?;

        let raw_status = bytes[RPC_RESPONSE_STATUS_OFFSET];
        let status = RpcResultStatus::try_from(raw_status)
            .map_err(|_| RpcMessageError::InvalidStatus(raw_status))?;
        let body = &bytes[RPC_RESPONSE_HEADER_SIZE..];

        if status == RpcResultStatus::Success {
            let mut values = WireCodec::decode(body, std::slice::from_ref(returns))?;
            // `decode` guarantees exactly one value here.
            let value = values.pop().unwrap_or(WireValue::Unit);
            return Ok(CallResponse::Success(value));
        }

        let mut fields = WireCodec::decode(body, &[WireType::Str, WireType::Str])?.into_iter();
        let (Some(WireValue::Str(kind)), Some(WireValue::Str(message))) =
            (fields.next(), fields.next())
        else {
            return Err(WireDecodeError::CountMismatch {
                expected: 2,
                actual: 0,
            }
            .into());
        };
        let failure = RpcFailure::new(kind, message);

        Ok(match status {
            RpcResultStatus::Fail => CallResponse::Fail(failure),
            _ => CallResponse::SystemError(failure),
        })
    }
}

fn check_header(
    bytes: &[u8],
    expected: RpcMessageType,
    header_size: usize,
) -> Result<(), RpcMessageError> {
    if bytes.len() < header_size {
        return Err(RpcMessageError::TooShort {
            len: bytes.len(),
            needed: header_size,
        });
    }

    let found = bytes[RPC_MSG_TYPE_OFFSET];
    match RpcMessageType::try_from(found) {
        Ok(msg_type) if msg_type == expected => Ok(()),
        _ => Err(RpcMessageError::UnexpectedMessageType { found }),
    }
}

// Frame related constants
pub const FRAME_LENGTH_FIELD_SIZE: usize = 4;

/// Upper bound on a single frame's payload unless configured otherwise.
///
/// A length prefix above this value is rejected before any payload buffer is
/// allocated, so a corrupt or hostile prefix cannot force a huge allocation.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Size of the read buffer used when pulling bytes off a socket.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Byte offset of the 1-byte message type (u8).
/// Values correspond to enum `RpcMessageType` variants.
pub const RPC_MSG_TYPE_OFFSET: usize = 0;

/// Byte offset where the 8-byte operation fingerprint (u64) begins in a call.
pub const RPC_CALL_FINGERPRINT_OFFSET: usize = 1;

/// Size in bytes of the operation fingerprint field (u64).
pub const RPC_CALL_FINGERPRINT_SIZE: usize = 8;

/// Total size of the fixed-length call header that precedes the argument
/// sequence.
pub const RPC_CALL_HEADER_SIZE: usize = RPC_CALL_FINGERPRINT_OFFSET + RPC_CALL_FINGERPRINT_SIZE; // 1 + 8 = 9

/// Byte offset of the 1-byte result status in a response.
pub const RPC_RESPONSE_STATUS_OFFSET: usize = 1;

/// Total size of the fixed-length response header that precedes the result
/// sequence.
pub const RPC_RESPONSE_HEADER_SIZE: usize = RPC_RESPONSE_STATUS_OFFSET + 1; // 1 + 1 = 2

/// Maximum nesting of lists and tuples accepted by the wire decoder.
pub const MAX_WIRE_NESTING_DEPTH: usize = 64;

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum RpcResultStatus {
    Success = 0,
    /// The bound implementation raised a fault.
    Fail = 1,
    /// The host could not run the implementation at all (bad payload,
    /// unknown operation, invalid return value).
    SystemError = 2,
}

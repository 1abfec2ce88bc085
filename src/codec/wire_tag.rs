use num_enum::{IntoPrimitive, TryFromPrimitive};

/// One-byte discriminant written ahead of every encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum WireTag {
    Unit = 0,
    Bool = 1,
    I32 = 2,
    I64 = 3,
    F32 = 4,
    F64 = 5,
    Str = 6,
    Bytes = 7,
    List = 8,
    Tuple = 9,
}

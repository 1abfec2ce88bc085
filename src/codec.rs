mod wire_codec;
mod wire_error;
mod wire_tag;
mod wire_type;
mod wire_value;

pub use wire_codec::WireCodec;
pub use wire_error::WireDecodeError;
pub use wire_tag::WireTag;
pub use wire_type::WireType;
pub use wire_value::WireValue;

pub mod constants;
pub use constants::*;

mod error;
pub use error::WireConvertError;

mod wire_format;
pub use wire_format::{WireArgs, WireFormat};

mod rpc_operation;
pub use rpc_operation::RpcOperation;

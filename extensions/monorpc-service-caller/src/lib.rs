mod caller_interface;
pub use caller_interface::*;

pub mod error;

mod typed_call;
pub use typed_call::RpcCallOperation;

mod interface_descriptor;
mod operation_descriptor;
mod rpc_error;
mod rpc_failure;
mod rpc_message_type;
mod rpc_request_response;
mod rpc_result_status;

pub use interface_descriptor::InterfaceDescriptor;
pub use operation_descriptor::OperationDescriptor;
pub use rpc_error::{DescriptorError, RpcMessageError};
pub use rpc_failure::{RpcFailure, failure_kind};
pub use rpc_message_type::RpcMessageType;
pub use rpc_request_response::{CallRequest, CallResponse};
pub use rpc_result_status::RpcResultStatus;

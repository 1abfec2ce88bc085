mod rpc_client;
pub use rpc_client::RpcClient;

mod rpc_client_config;
pub use rpc_client_config::RpcClientConfig;

pub use monorpc_service_caller::{
    RpcCallOperation, RpcServiceCallerInterface,
    error::{RpcCallerError, TransportError},
};

//! Note: This host does not include authentication or authorization. It is
//! best suited for trusted, internal network communication.

mod connection;

mod error;
pub use error::{ConfigurationError, RpcServerError};

mod rpc_server;
pub use rpc_server::*;

mod rpc_server_config;
pub use rpc_server_config::RpcServerConfig;

mod service_handle;
pub use service_handle::ServiceHandle;

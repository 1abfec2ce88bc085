use monorpc_service::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_FRAME_SIZE};
use std::time::Duration;

/// Tunables for [`crate::RpcClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcClientConfig {
    /// Largest response frame accepted, and largest request frame sent.
    pub max_frame_size: usize,
    pub connect_timeout: Duration,
    /// Upper bound on waiting for one response. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Keep the connection open between calls.
    pub reuse_connection: bool,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
            reuse_connection: true,
        }
    }
}

impl RpcClientConfig {
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    pub fn with_reuse_connection(mut self, reuse_connection: bool) -> Self {
        self.reuse_connection = reuse_connection;
        self
    }
}

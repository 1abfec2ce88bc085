use monorpc_service::constants::{
    DEFAULT_BIND_HOST, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_FRAME_SIZE, DEFAULT_SHUTDOWN_GRACE_PERIOD,
};
use std::time::Duration;

/// Tunables for [`crate::RpcServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcServerConfig {
    /// Host or IP address the listener binds to.
    pub bind_host: String,
    /// Largest request frame accepted, and largest response frame sent.
    pub max_frame_size: usize,
    /// A keep-alive connection with no request for this long is closed.
    pub idle_timeout: Duration,
    /// How long `stop` lets in-flight calls finish before aborting them.
    pub shutdown_grace_period: Duration,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_owned(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            shutdown_grace_period: DEFAULT_SHUTDOWN_GRACE_PERIOD,
        }
    }
}

impl RpcServerConfig {
    pub fn with_bind_host(mut self, bind_host: impl Into<String>) -> Self {
        self.bind_host = bind_host.into();
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_shutdown_grace_period(mut self, grace: Duration) -> Self {
        self.shutdown_grace_period = grace;
        self
    }
}

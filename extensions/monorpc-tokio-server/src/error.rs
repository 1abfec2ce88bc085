use monorpc::rpc::DescriptorError;
use std::io;
use thiserror::Error;

/// Problems with what the host was asked to do. Detected before any
/// connection is accepted.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Interface(#[from] DescriptorError),

    #[error("address {addr} is already in use")]
    AddressInUse { addr: String },

    #[error("invalid bind address `{addr}`: {reason}")]
    InvalidBindAddress { addr: String, reason: String },

    #[error("max frame size must be at least {min} bytes, got {max}")]
    FrameLimitTooSmall { max: usize, min: usize },

    #[error("idle timeout must be greater than zero")]
    ZeroIdleTimeout,
}

#[derive(Debug, Error)]
pub enum RpcServerError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RpcServerError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, RpcServerError::Configuration(_))
    }
}

impl From<DescriptorError> for RpcServerError {
    fn from(err: DescriptorError) -> Self {
        RpcServerError::Configuration(ConfigurationError::Interface(err))
    }
}

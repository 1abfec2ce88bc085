use crate::connection::{ConnectionContext, ConnectionGuard, serve_connection};
use crate::{ConfigurationError, RpcServerConfig, RpcServerError, ServiceHandle};
use monorpc::codec::WireValue;
use monorpc::constants::RPC_CALL_HEADER_SIZE;
use monorpc::rpc::InterfaceDescriptor;
use monorpc_service::RpcOperation;
use monorpc_service::constants::DEFAULT_ACCEPT_ERROR_BACKOFF;
use monorpc_service_endpoint::{RpcHandlerError, RpcServiceEndpoint};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

/// Hosts one implementation of a single-operation interface on a TCP port.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use monorpc::codec::{WireType, WireValue};
/// use monorpc::rpc::{InterfaceDescriptor, OperationDescriptor};
/// use monorpc_tokio_server::RpcServer;
///
/// let square = OperationDescriptor::new("square", vec![WireType::I32], WireType::F64)?;
/// let interface = InterfaceDescriptor::of("HelloWorld", square);
///
/// let handle = RpcServer::host(8023, &interface, |args| async move {
///     match args.as_slice() {
///         [WireValue::I32(x)] => Ok(WireValue::F64(f64::from(*x) * f64::from(*x))),
///         _ => Err("unexpected arguments".into()),
///     }
/// })
/// .await?;
///
/// handle.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct RpcServer {
    config: RpcServerConfig,
    endpoint: Arc<RpcServiceEndpoint>,
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServer {
    pub fn new() -> Self {
        Self::with_config(RpcServerConfig::default())
    }

    pub fn with_config(config: RpcServerConfig) -> Self {
        RpcServer {
            config,
            endpoint: Arc::new(RpcServiceEndpoint::new()),
        }
    }

    pub fn config(&self) -> &RpcServerConfig {
        &self.config
    }

    /// Hosts `implementation` on `port` with the default configuration.
    ///
    /// Port `0` picks an ephemeral port; see [`ServiceHandle::local_addr`].
    pub async fn host<F, Fut>(
        port: u16,
        interface: &InterfaceDescriptor,
        implementation: F,
    ) -> Result<ServiceHandle, RpcServerError>
    where
        F: Fn(Vec<WireValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<WireValue, RpcHandlerError>> + Send + 'static,
    {
        Self::new().serve(port, interface, implementation).await
    }

    pub async fn host_with_config<F, Fut>(
        config: RpcServerConfig,
        port: u16,
        interface: &InterfaceDescriptor,
        implementation: F,
    ) -> Result<ServiceHandle, RpcServerError>
    where
        F: Fn(Vec<WireValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<WireValue, RpcHandlerError>> + Send + 'static,
    {
        Self::with_config(config)
            .serve(port, interface, implementation)
            .await
    }

    /// Typed counterpart of [`RpcServer::host`].
    pub async fn host_operation<Op, F, Fut, E>(
        port: u16,
        implementation: F,
    ) -> Result<ServiceHandle, RpcServerError>
    where
        Op: RpcOperation,
        F: Fn(Op::Input) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Op::Output, E>> + Send + 'static,
        E: Into<RpcHandlerError>,
    {
        Self::new()
            .serve_operation::<Op, F, Fut, E>(port, implementation)
            .await
    }

    /// Validates the interface and configuration, binds the listener and
    /// starts accepting connections.
    pub async fn serve<F, Fut>(
        self,
        port: u16,
        interface: &InterfaceDescriptor,
        implementation: F,
    ) -> Result<ServiceHandle, RpcServerError>
    where
        F: Fn(Vec<WireValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<WireValue, RpcHandlerError>> + Send + 'static,
    {
        let operation = interface.single_operation()?.clone();
        self.validate_config()?;

        self.endpoint.register(operation, implementation);
        self.start(port, interface.clone()).await
    }

    pub async fn serve_operation<Op, F, Fut, E>(
        self,
        port: u16,
        implementation: F,
    ) -> Result<ServiceHandle, RpcServerError>
    where
        Op: RpcOperation,
        F: Fn(Op::Input) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Op::Output, E>> + Send + 'static,
        E: Into<RpcHandlerError>,
    {
        let interface = Op::interface()?;
        self.validate_config()?;

        self.endpoint.register_operation::<Op, F, Fut, E>(implementation)?;
        self.start(port, interface).await
    }

    fn validate_config(&self) -> Result<(), ConfigurationError> {
        let bind_host = self.config.bind_host.trim();
        if bind_host.is_empty() {
            return Err(ConfigurationError::InvalidBindAddress {
                addr: self.config.bind_host.clone(),
                reason: "bind host is empty".into(),
            });
        }

        if self.config.max_frame_size < RPC_CALL_HEADER_SIZE {
            return Err(ConfigurationError::FrameLimitTooSmall {
                max: self.config.max_frame_size,
                min: RPC_CALL_HEADER_SIZE,
            });
        }

        if self.config.idle_timeout.is_zero() {
            return Err(ConfigurationError::ZeroIdleTimeout);
        }

        Ok(())
    }

    async fn start(
        self,
        port: u16,
        interface: InterfaceDescriptor,
    ) -> Result<ServiceHandle, RpcServerError> {
        let host = self.config.bind_host.trim().to_owned();
        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|source| classify_bind_error(format!("{host}:{port}"), source))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let active_connections = Arc::new(AtomicUsize::new(0));
        let context = Arc::new(ConnectionContext {
            endpoint: self.endpoint,
            config: self.config,
            active_connections: active_connections.clone(),
        });

        let service = interface
            .operations()
            .first()
            .map(|op| format!("{}.{}", interface.name(), op.name()))
            .unwrap_or_else(|| interface.name().to_owned());
        tracing::info!(%service, %local_addr, "service listening");

        let accept_task = tokio::spawn(
            accept_loop(listener, context, shutdown_rx)
                .instrument(tracing::info_span!("rpc_server", %local_addr)),
        );

        Ok(ServiceHandle::new(
            interface,
            local_addr,
            shutdown_tx,
            accept_task,
            active_connections,
        ))
    }
}

fn classify_bind_error(addr: String, source: io::Error) -> RpcServerError {
    match source.kind() {
        io::ErrorKind::AddrInUse => ConfigurationError::AddressInUse { addr }.into(),
        io::ErrorKind::AddrNotAvailable | io::ErrorKind::InvalidInput => {
            ConfigurationError::InvalidBindAddress {
                addr,
                reason: source.to_string(),
            }
            .into()
        }
        _ => RpcServerError::Bind { addr, source },
    }
}

/// Accepts connections until shutdown is signalled, then drains them.
///
/// Idle connections observe the same signal and close on their own;
/// connections still dispatching get `shutdown_grace_period` before they are
/// aborted.
async fn accept_loop(
    listener: TcpListener,
    context: Arc<ConnectionContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,

            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if let Err(err) = stream.set_nodelay(true) {
                        tracing::debug!(%peer, error = %err, "failed to set TCP_NODELAY");
                    }

                    tracing::debug!(%peer, "accepted connection");
                    let guard = ConnectionGuard::new(context.active_connections.clone());
                    connections.spawn(
                        serve_connection(stream, context.clone(), shutdown.clone(), guard)
                            .instrument(tracing::debug_span!("connection", %peer)),
                    );
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept connection");
                    tokio::time::sleep(DEFAULT_ACCEPT_ERROR_BACKOFF).await;
                }
            },

            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                log_connection_exit(finished);
            }
        }
    }

    drop(listener);
    tracing::info!(in_flight = connections.len(), "listener closed");

    let grace = context.config.shutdown_grace_period;
    let drained = tokio::time::timeout(grace, async {
        while let Some(finished) = connections.join_next().await {
            log_connection_exit(finished);
        }
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            remaining = connections.len(),
            ?grace,
            "grace period elapsed, aborting connections"
        );
        connections.shutdown().await;
    }
}

fn log_connection_exit(finished: Result<(), JoinError>) {
    if let Err(err) = finished {
        if err.is_panic() {
            tracing::error!(error = %err, "connection task panicked");
        }
    }
}

use crate::RpcClientConfig;
use monorpc::constants::RPC_CALL_HEADER_SIZE;
use monorpc::frame::{FrameEncodeError, FrameIoError, FramedStream};
use monorpc::rpc::{
    CallRequest, CallResponse, InterfaceDescriptor, OperationDescriptor, RpcResultStatus,
};
use monorpc_service::RpcOperation;
use monorpc_service_caller::RpcServiceCallerInterface;
use monorpc_service_caller::error::{RpcCallerError, TransportError};
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// A local stand-in for an operation hosted elsewhere.
///
/// Construction only validates; the first call opens the connection. With
/// `reuse_connection` enabled the connection is kept for later calls, and a
/// kept connection found closed by the host is replaced and the call retried
/// once. Calls through the same client are serialized.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use monorpc::codec::{WireType, WireValue};
/// use monorpc::rpc::{InterfaceDescriptor, OperationDescriptor};
/// use monorpc_tokio_client::{RpcClient, RpcServiceCallerInterface};
///
/// let square = OperationDescriptor::new("square", vec![WireType::I32], WireType::F64)?;
/// let interface = InterfaceDescriptor::of("HelloWorld", square);
///
/// let client = RpcClient::new(&interface, "localhost", 8023)?;
/// let result = client.call(vec![WireValue::I32(5)]).await?;
/// assert_eq!(result, WireValue::F64(25.0));
/// # Ok(())
/// # }
/// ```
pub struct RpcClient {
    interface: InterfaceDescriptor,
    operation: OperationDescriptor,
    host: String,
    port: u16,
    config: RpcClientConfig,
    connection: Mutex<Option<FramedStream<TcpStream>>>,
}

#[derive(Debug)]
enum ExchangeError {
    /// The connection was closed before any part of the response arrived.
    Stale(TransportError),
    Failed(TransportError),
}

impl RpcClient {
    pub fn new(
        interface: &InterfaceDescriptor,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self, RpcCallerError> {
        Self::with_config(RpcClientConfig::default(), interface, host, port)
    }

    pub fn with_config(
        config: RpcClientConfig,
        interface: &InterfaceDescriptor,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self, RpcCallerError> {
        let operation = interface.single_operation()?.clone();

        let host = host.into().trim().to_owned();
        if host.is_empty() {
            return Err(RpcCallerError::InvalidConfig("host is empty".into()));
        }
        if config.max_frame_size < RPC_CALL_HEADER_SIZE {
            return Err(RpcCallerError::InvalidConfig(format!(
                "max frame size {} is below the {RPC_CALL_HEADER_SIZE} byte request header",
                config.max_frame_size
            )));
        }

        Ok(Self {
            interface: interface.clone(),
            operation,
            host,
            port,
            config,
            connection: Mutex::new(None),
        })
    }

    /// Binds a client to `Op`'s single-operation interface.
    pub fn for_operation<Op: RpcOperation>(
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self, RpcCallerError> {
        Self::for_operation_with_config::<Op>(RpcClientConfig::default(), host, port)
    }

    pub fn for_operation_with_config<Op: RpcOperation>(
        config: RpcClientConfig,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self, RpcCallerError> {
        let interface = Op::interface()?;
        Self::with_config(config, &interface, host, port)
    }

    pub fn interface(&self) -> &InterfaceDescriptor {
        &self.interface
    }

    pub fn config(&self) -> &RpcClientConfig {
        &self.config
    }

    /// `host:port` of the remote service.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether a connection is currently held for reuse.
    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Closes the held connection, if any. The next call reconnects.
    pub async fn close(&self) {
        if let Some(mut framed) = self.connection.lock().await.take() {
            if let Err(err) = framed.shutdown().await {
                tracing::trace!(error = %err, "shutdown of closed connection failed");
            }
            tracing::debug!(addr = %self.addr(), "connection closed");
        }
    }

    async fn connect(&self) -> Result<FramedStream<TcpStream>, TransportError> {
        let addr = self.addr();
        let timeout = self.config.connect_timeout;

        let stream = match tokio::time::timeout(
            timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(TransportError::Connect { addr, source }),
            Err(_) => return Err(TransportError::ConnectTimeout { addr, timeout }),
        };

        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %err, "failed to set TCP_NODELAY");
        }

        tracing::debug!(%addr, "connected");
        Ok(FramedStream::new(stream, self.config.max_frame_size))
    }

    async fn exchange_with_timeout(
        &self,
        framed: &mut FramedStream<TcpStream>,
        payload: &[u8],
    ) -> Result<Vec<u8>, ExchangeError> {
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange(framed, payload))
                .await
                .unwrap_or(Err(ExchangeError::Failed(TransportError::RequestTimeout(
                    limit,
                )))),
            None => exchange(framed, payload).await,
        }
    }
}

#[async_trait::async_trait]
impl RpcServiceCallerInterface for RpcClient {
    fn operation(&self) -> &OperationDescriptor {
        &self.operation
    }

    async fn invoke_remote(&self, request: CallRequest) -> Result<CallResponse, RpcCallerError> {
        let payload = request.encode();

        let mut slot = self.connection.lock().await;
        let mut reused = slot.is_some();
        let mut framed = match slot.take() {
            Some(framed) => framed,
            None => self.connect().await?,
        };

        loop {
            match self.exchange_with_timeout(&mut framed, &payload).await {
                Ok(frame) => {
                    let response = CallResponse::decode(&frame, self.operation.returns())?;
                    // The host may drop the connection after a system error.
                    if self.config.reuse_connection
                        && response.status() != RpcResultStatus::SystemError
                    {
                        *slot = Some(framed);
                    }
                    return Ok(response);
                }
                Err(ExchangeError::Stale(err)) if reused => {
                    tracing::debug!(error = %err, "held connection was stale, reconnecting");
                    reused = false;
                    framed = self.connect().await?;
                }
                Err(ExchangeError::Stale(err)) | Err(ExchangeError::Failed(err)) => {
                    return Err(err.into());
                }
            }
        }
    }
}

/// Writes one request and reads one response on `framed`.
async fn exchange<S>(framed: &mut FramedStream<S>, payload: &[u8]) -> Result<Vec<u8>, ExchangeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match framed.write_frame(payload).await {
        Ok(()) => {}
        Err(FrameIoError::Io(err)) if is_reset(&err) => {
            // The host may have answered before closing, e.g. when it
            // rejected an oversized request.
            return match framed.read_frame().await {
                Ok(Some(frame)) => Ok(frame),
                _ => Err(ExchangeError::Stale(TransportError::Io(err))),
            };
        }
        Err(err) => return Err(ExchangeError::Failed(transport_error(err))),
    }

    match framed.read_frame().await {
        Ok(Some(frame)) => Ok(frame),
        Ok(None) => Err(ExchangeError::Stale(TransportError::ConnectionClosed)),
        Err(FrameIoError::Io(err)) if is_reset(&err) => {
            Err(ExchangeError::Stale(TransportError::Io(err)))
        }
        Err(err) => Err(ExchangeError::Failed(transport_error(err))),
    }
}

fn is_reset(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

fn transport_error(err: FrameIoError) -> TransportError {
    match err {
        FrameIoError::ConnectionClosed => TransportError::ConnectionClosed,
        FrameIoError::FrameTooLarge { declared, max } => {
            TransportError::FrameTooLarge { declared, max }
        }
        FrameIoError::Encode(FrameEncodeError::FrameTooLarge { len, max }) => {
            TransportError::FrameTooLarge {
                declared: len,
                max,
            }
        }
        FrameIoError::Io(err) => TransportError::Io(err),
    }
}

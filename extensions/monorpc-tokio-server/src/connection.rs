use crate::RpcServerConfig;
use monorpc::frame::{FrameIoError, FramedStream};
use monorpc::rpc::{CallResponse, failure_kind};
use monorpc_service_endpoint::RpcServiceEndpoint;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpStream;
use tokio::sync::watch;

pub(crate) struct ConnectionContext {
    pub(crate) endpoint: Arc<RpcServiceEndpoint>,
    pub(crate) config: RpcServerConfig,
    pub(crate) active_connections: Arc<AtomicUsize>,
}

/// Counts a live connection for as long as it exists, including when its
/// task is aborted.
pub(crate) struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    pub(crate) fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serves requests on one connection, strictly one at a time and in order.
///
/// The connection ends when the peer closes it, it stays idle past
/// `idle_timeout`, a protocol error occurs, or shutdown is signalled while
/// waiting for the next request. A call that is already dispatching runs to
/// completion and its response is written before the shutdown is observed.
pub(crate) async fn serve_connection(
    stream: TcpStream,
    context: Arc<ConnectionContext>,
    mut shutdown: watch::Receiver<bool>,
    _guard: ConnectionGuard,
) {
    let config = &context.config;
    let mut framed = FramedStream::new(stream, config.max_frame_size);

    loop {
        if *shutdown.borrow() {
            tracing::debug!("closing connection for shutdown");
            break;
        }

        let read = tokio::select! {
            _ = shutdown.changed() => {
                tracing::debug!("closing idle connection for shutdown");
                break;
            }
            read = tokio::time::timeout(config.idle_timeout, framed.read_frame()) => read,
        };

        let frame = match read {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                tracing::debug!("peer closed connection");
                break;
            }
            Ok(Err(FrameIoError::FrameTooLarge { declared, max })) => {
                tracing::warn!(declared, max, "rejecting oversized request frame");
                let response = CallResponse::system_error(
                    failure_kind::FRAME_TOO_LARGE,
                    format!("request frame of {declared} bytes exceeds the {max} byte limit"),
                );
                write_best_effort(&mut framed, &response, config).await;
                break;
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "failed to read request");
                break;
            }
            Err(_) => {
                tracing::debug!(timeout = ?config.idle_timeout, "closing idle connection");
                break;
            }
        };

        let response = match context.endpoint.decode_request(&frame) {
            Ok(request) => context.endpoint.invoke(request).await,
            Err(err) => {
                tracing::warn!(error = %err, "rejecting request");
                write_best_effort(&mut framed, &err.to_response(), config).await;
                break;
            }
        };

        match framed.write_frame(&response.encode()).await {
            Ok(()) => tracing::trace!(status = ?response.status(), "response written"),
            Err(FrameIoError::Encode(err)) => {
                // Nothing was written, so the stream is still in sync.
                tracing::error!(error = %err, "response exceeds frame limit");
                let response =
                    CallResponse::system_error(failure_kind::FRAME_TOO_LARGE, err.to_string());
                if framed.write_frame(&response.encode()).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to write response");
                break;
            }
        }
    }

    if let Err(err) = framed.shutdown().await {
        tracing::trace!(error = %err, "shutdown of closed connection failed");
    }
}

async fn write_best_effort(
    framed: &mut FramedStream<TcpStream>,
    response: &CallResponse,
    config: &RpcServerConfig,
) {
    let payload = response.encode();
    match tokio::time::timeout(config.idle_timeout, framed.write_frame(&payload)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::debug!(error = %err, "could not deliver error response"),
        Err(_) => tracing::debug!("timed out delivering error response"),
    }
}

use futures::FutureExt;
use monorpc::rpc::InterfaceDescriptor;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::task::{AbortHandle, JoinHandle};

/// A running service. Cloning yields another handle to the same service.
///
/// Call [`stop`](Self::stop) to shut down gracefully. When the last handle is
/// dropped without stopping, all server tasks are aborted.
#[derive(Clone, Debug)]
pub struct ServiceHandle {
    inner: Arc<ServiceInner>,
}

#[derive(Debug)]
struct ServiceInner {
    interface: InterfaceDescriptor,
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    abort_handle: AbortHandle,
    active_connections: Arc<AtomicUsize>,
}

impl ServiceHandle {
    pub(crate) fn new(
        interface: InterfaceDescriptor,
        local_addr: SocketAddr,
        shutdown: watch::Sender<bool>,
        accept_task: JoinHandle<()>,
        active_connections: Arc<AtomicUsize>,
    ) -> Self {
        let abort_handle = accept_task.abort_handle();
        Self {
            inner: Arc::new(ServiceInner {
                interface,
                local_addr,
                shutdown,
                accept_task: Mutex::new(Some(accept_task)),
                abort_handle,
                active_connections,
            }),
        }
    }

    pub fn interface(&self) -> &InterfaceDescriptor {
        &self.inner.interface
    }

    /// The address the listener is bound to, with the actual port when the
    /// service was hosted on port `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    pub fn is_running(&self) -> bool {
        !*self.inner.shutdown.borrow() && !self.inner.abort_handle.is_finished()
    }

    pub fn active_connections(&self) -> usize {
        self.inner.active_connections.load(Ordering::SeqCst)
    }

    /// Stops accepting, closes idle connections, and waits for in-flight
    /// calls up to the configured grace period.
    ///
    /// Idempotent. Concurrent callers all return once shutdown is complete,
    /// at which point the port can be bound again.
    pub async fn stop(&self) {
        let already_stopping = self.inner.shutdown.send_replace(true);
        if !already_stopping {
            tracing::info!(local_addr = %self.inner.local_addr, "stopping service");
        }

        let mut accept_task = self.inner.accept_task.lock().await;
        if let Some(task) = accept_task.take() {
            if let Err(err) = task.await {
                if err.is_panic() {
                    tracing::error!(error = %err, "accept loop panicked");
                }
            }
            tracing::info!(local_addr = %self.inner.local_addr, "service stopped");
        }
    }

    /// Runs `body` with a handle to this service and stops the service
    /// afterwards, whether `body` returns or panics.
    ///
    /// A panic in `body` is resumed once the service has stopped.
    pub async fn run_scoped<F, Fut, T>(self, body: F) -> T
    where
        F: FnOnce(ServiceHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        let handle = self.clone();
        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(move || body(handle))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(panic) => Err(panic),
        };
        self.stop().await;

        match outcome {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
        self.abort_handle.abort();
    }
}

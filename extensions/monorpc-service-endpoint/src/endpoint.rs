use crate::error::RpcServiceEndpointError;
use futures::FutureExt;
use monorpc::codec::WireValue;
use monorpc::rpc::{
    CallRequest, CallResponse, DescriptorError, OperationDescriptor, RpcFailure, failure_kind,
};
use monorpc_service::{RpcOperation, WireArgs, WireFormat};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use std::{future::Future, pin::Pin};

pub type RpcHandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type RpcHandlerFuture = Pin<Box<dyn Future<Output = Result<WireValue, RpcHandlerError>> + Send>>;

pub type RpcHandler = Arc<dyn Fn(Vec<WireValue>) -> RpcHandlerFuture + Send + Sync>;

#[derive(Clone)]
struct Binding {
    descriptor: Arc<OperationDescriptor>,
    handler: RpcHandler,
}

/// Maps operation fingerprints to implementations and turns every outcome of
/// an invocation, including panics, into a [`CallResponse`].
///
/// Lookups take a read lock only long enough to clone the binding, so any
/// number of invocations can run at once. The table does not serialize
/// calls; an implementation that is not reentrant has to guard itself.
#[derive(Default)]
pub struct RpcServiceEndpoint {
    bindings: RwLock<HashMap<u64, Binding>>,
}

impl RpcServiceEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to the descriptor's fingerprint.
    ///
    /// Registering the same fingerprint again replaces the earlier binding
    /// (last write wins). Returns `true` when a binding was replaced.
    pub fn register<F, Fut>(&self, descriptor: OperationDescriptor, handler: F) -> bool
    where
        F: Fn(Vec<WireValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<WireValue, RpcHandlerError>> + Send + 'static,
    {
        let fingerprint = descriptor.fingerprint();
        let signature = descriptor.signature();
        let handler: RpcHandler =
            Arc::new(move |args: Vec<WireValue>| Box::pin(handler(args)) as RpcHandlerFuture);
        let binding = Binding {
            descriptor: Arc::new(descriptor),
            handler,
        };

        let replaced = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fingerprint, binding)
            .is_some();

        if replaced {
            tracing::debug!(%signature, "replaced existing binding");
        } else {
            tracing::debug!(%signature, "registered binding");
        }

        replaced
    }

    /// Typed variant of [`register`](Self::register) for an [`RpcOperation`].
    ///
    /// Errors returned by `handler` are reported as application failures; an
    /// [`RpcFailure`] keeps its kind.
    pub fn register_operation<Op, F, Fut, E>(&self, handler: F) -> Result<bool, DescriptorError>
    where
        Op: RpcOperation,
        F: Fn(Op::Input) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Op::Output, E>> + Send + 'static,
        E: Into<RpcHandlerError>,
    {
        let descriptor = Op::descriptor()?;
        let handler = Arc::new(handler);

        Ok(self.register(descriptor, move |args| {
            let handler = Arc::clone(&handler);
            async move {
                let input = Op::Input::from_args(args)?;
                let output = handler(input)
                    .await
                    .map_err(Into::<RpcHandlerError>::into)?;
                Ok::<_, RpcHandlerError>(output.into_wire())
            }
        }))
    }

    pub fn descriptor(&self, fingerprint: u64) -> Option<Arc<OperationDescriptor>> {
        self.binding(fingerprint).map(|binding| binding.descriptor)
    }

    pub fn len(&self) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses a raw request payload against the registered binding's
    /// parameter types.
    pub fn decode_request(&self, payload: &[u8]) -> Result<CallRequest, RpcServiceEndpointError> {
        let fingerprint = CallRequest::peek_fingerprint(payload)
            .map_err(RpcServiceEndpointError::InvalidRequest)?;

        let binding = self
            .binding(fingerprint)
            .ok_or(RpcServiceEndpointError::UnknownOperation { fingerprint })?;

        CallRequest::decode(payload, binding.descriptor.params()).map_err(|source| {
            RpcServiceEndpointError::MalformedPayload {
                operation: binding.descriptor.signature(),
                source,
            }
        })
    }

    /// Decodes and dispatches a raw request payload in one step.
    pub async fn invoke_bytes(&self, payload: &[u8]) -> CallResponse {
        match self.decode_request(payload) {
            Ok(request) => self.invoke(request).await,
            Err(err) => err.to_response(),
        }
    }

    /// Runs the implementation bound to `request.fingerprint`.
    ///
    /// Never fails and never panics: every fault is reported through the
    /// returned response.
    pub async fn invoke(&self, request: CallRequest) -> CallResponse {
        let Some(binding) = self.binding(request.fingerprint) else {
            return RpcServiceEndpointError::UnknownOperation {
                fingerprint: request.fingerprint,
            }
            .to_response();
        };
        let descriptor = &binding.descriptor;

        if let Err(message) = check_args(descriptor, &request.args) {
            return CallResponse::system_error(failure_kind::MALFORMED_PAYLOAD, message);
        }

        let handler = Arc::clone(&binding.handler);
        let args = request.args;

        // The handler can panic before producing its future, or while it is
        // being polled.
        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(move || handler(args))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(panic) => Err(panic),
        };

        match outcome {
            Ok(Ok(value)) if value.conforms_to(descriptor.returns()) => CallResponse::Success(value),
            Ok(Ok(value)) => {
                tracing::error!(
                    operation = %descriptor.signature(),
                    found = value.kind_name(),
                    "implementation returned a value of the wrong type"
                );
                CallResponse::system_error(
                    failure_kind::INVALID_RETURN_VALUE,
                    format!(
                        "`{}` must return `{}`, implementation returned `{}`",
                        descriptor.name(),
                        descriptor.returns(),
                        value.kind_name()
                    ),
                )
            }
            Ok(Err(err)) => {
                let failure = into_failure(err);
                tracing::debug!(
                    operation = %descriptor.signature(),
                    %failure,
                    "implementation failed"
                );
                CallResponse::Fail(failure)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    operation = %descriptor.signature(),
                    %message,
                    "implementation panicked"
                );
                CallResponse::Fail(RpcFailure::new(failure_kind::PANIC, message))
            }
        }
    }

    fn binding(&self, fingerprint: u64) -> Option<Binding> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&fingerprint)
            .cloned()
    }
}

fn check_args(descriptor: &OperationDescriptor, args: &[WireValue]) -> Result<(), String> {
    let params = descriptor.params();
    if args.len() != params.len() {
        return Err(format!(
            "`{}` takes {} arguments, request carried {}",
            descriptor.name(),
            params.len(),
            args.len()
        ));
    }

    match args.iter().zip(params).position(|(arg, ty)| !arg.conforms_to(ty)) {
        Some(index) => Err(format!(
            "argument {index} of `{}` must be `{}`, found `{}`",
            descriptor.name(),
            params[index],
            args[index].kind_name()
        )),
        None => Ok(()),
    }
}

fn into_failure(err: RpcHandlerError) -> RpcFailure {
    match err.downcast::<RpcFailure>() {
        Ok(failure) => *failure,
        Err(other) => RpcFailure::application(other.to_string()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "implementation panicked".to_owned()
    }
}

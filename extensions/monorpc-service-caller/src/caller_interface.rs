use crate::error::RpcCallerError;
use monorpc::codec::WireValue;
use monorpc::rpc::{CallRequest, CallResponse, OperationDescriptor};

/// Defines a generic capability for invoking one remote operation.
///
/// Implementors only supply the descriptor they are bound to and a way to
/// move one encoded request to the host and back. Argument validation and
/// the mapping of responses onto [`RpcCallerError`] come for free.
#[async_trait::async_trait]
pub trait RpcServiceCallerInterface: Send + Sync {
    // --- METHODS TO BE IMPLEMENTED BY THE STRUCT (e.g., RpcClient) ---

    /// The operation this caller is bound to.
    fn operation(&self) -> &OperationDescriptor;

    /// Sends one request and waits for its response.
    async fn invoke_remote(&self, request: CallRequest) -> Result<CallResponse, RpcCallerError>;

    // --- METHODS PROVIDED AUTOMATICALLY BY THE TRAIT ---

    /// Validates `args` against the operation, sends them, and unwraps the
    /// response.
    async fn call(&self, args: Vec<WireValue>) -> Result<WireValue, RpcCallerError> {
        let operation = self.operation();
        check_args(operation, &args)?;

        let request = CallRequest::new(operation, args);
        tracing::trace!(operation = %operation.name(), "sending call");

        match self.invoke_remote(request).await? {
            CallResponse::Success(value) => Ok(value),
            CallResponse::Fail(failure) => Err(RpcCallerError::Application(failure)),
            CallResponse::SystemError(failure) => Err(RpcCallerError::RemoteSystemError(failure)),
        }
    }
}

fn check_args(operation: &OperationDescriptor, args: &[WireValue]) -> Result<(), RpcCallerError> {
    let params = operation.params();
    if args.len() != params.len() {
        return Err(RpcCallerError::InvalidArguments(format!(
            "`{}` takes {} arguments, got {}",
            operation.name(),
            params.len(),
            args.len()
        )));
    }

    for (index, (arg, ty)) in args.iter().zip(params).enumerate() {
        if !arg.conforms_to(ty) {
            return Err(RpcCallerError::InvalidArguments(format!(
                "argument {index} of `{}` must be `{ty}`, got `{}`",
                operation.name(),
                arg.kind_name()
            )));
        }
    }

    Ok(())
}

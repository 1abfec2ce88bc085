use crate::{RpcServiceCallerInterface, error::RpcCallerError};
use monorpc_service::{RpcOperation, WireArgs, WireFormat};

/// Typed calls for any [`RpcOperation`]: `Square::call(&client, (5,))`.
#[async_trait::async_trait]
pub trait RpcCallOperation: RpcOperation {
    async fn call<C>(client: &C, input: Self::Input) -> Result<Self::Output, RpcCallerError>
    where
        C: RpcServiceCallerInterface;
}

/// Blanket implementation of the `RpcCallOperation` trait for any type that
/// also implements `RpcOperation`.
#[async_trait::async_trait]
impl<T> RpcCallOperation for T
where
    T: RpcOperation,
{
    async fn call<C>(client: &C, input: Self::Input) -> Result<Self::Output, RpcCallerError>
    where
        C: RpcServiceCallerInterface,
    {
        let expected = T::descriptor()?;
        let bound = client.operation();
        if bound.fingerprint() != expected.fingerprint() {
            return Err(RpcCallerError::OperationMismatch {
                bound: bound.signature(),
                requested: expected.signature(),
            });
        }

        let value = client.call(input.into_args()).await?;
        Ok(T::Output::from_wire(value)?)
    }
}

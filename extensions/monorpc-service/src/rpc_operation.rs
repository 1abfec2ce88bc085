use crate::{WireArgs, WireFormat};
use monorpc::rpc::{DescriptorError, InterfaceDescriptor, OperationDescriptor};

/// A statically typed, single-operation interface.
///
/// The descriptor is derived from the associated types, so a host and a
/// client built from the same `RpcOperation` always agree on the fingerprint.
///
/// ```rust,no_run
/// use monorpc_service::RpcOperation;
///
/// pub struct Square;
///
/// impl RpcOperation for Square {
///     const INTERFACE: &'static str = "HelloWorld";
///     const NAME: &'static str = "square";
///
///     type Input = (i32,);
///     type Output = f64;
/// }
///
/// assert_eq!(Square::descriptor().unwrap().signature(), "square(i32)->f64");
/// ```
pub trait RpcOperation: Send + Sync + 'static {
    /// Name of the interface that declares this operation.
    const INTERFACE: &'static str;

    /// Name of the operation itself.
    const NAME: &'static str;

    type Input: WireArgs + Send + 'static;

    type Output: WireFormat + Send + 'static;

    fn descriptor() -> Result<OperationDescriptor, DescriptorError> {
        OperationDescriptor::new(
            Self::NAME,
            Self::Input::wire_types(),
            Self::Output::wire_type(),
        )
    }

    fn interface() -> Result<InterfaceDescriptor, DescriptorError> {
        Ok(InterfaceDescriptor::of(Self::INTERFACE, Self::descriptor()?))
    }
}

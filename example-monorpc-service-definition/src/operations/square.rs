use monorpc_service::RpcOperation;

/// `HelloWorld.square(i32) -> f64`
pub struct Square;

impl RpcOperation for Square {
    const INTERFACE: &'static str = "HelloWorld";
    const NAME: &'static str = "square";

    type Input = (i32,);
    type Output = f64;
}

use monorpc_service::RpcOperation;

pub struct Echo;

impl RpcOperation for Echo {
    const INTERFACE: &'static str = "Echo";
    const NAME: &'static str = "echo";

    type Input = (String,);
    type Output = String;
}

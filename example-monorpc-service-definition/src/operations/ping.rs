use monorpc_service::RpcOperation;

pub struct Ping;

impl RpcOperation for Ping {
    const INTERFACE: &'static str = "Health";
    const NAME: &'static str = "ping";

    type Input = ();
    type Output = ();
}
